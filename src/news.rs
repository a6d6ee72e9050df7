// src/news.rs

//! Monthly headlines and breaking news.
//!
//! Headlines are flavour: they reach agents through their market context but
//! never move prices. Price-moving shocks live in [`crate::events`].

use crate::events::HistoricalEvent;
use crate::stocks::InstrumentBook;
use crate::types::TurnDate;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Most recent headlines kept in the simulation state.
pub const NEWS_CAP: usize = 20;
/// Chance of a headline in any given month.
pub const HEADLINE_CHANCE: f64 = 0.7;
/// Chance that a published headline is critical (breaking).
pub const CRITICAL_CHANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsCategory {
    Market,
    Company,
    Economy,
    Politics,
    Event,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: u64,
    pub date: TurnDate,
    pub headline: String,
    pub category: NewsCategory,
    pub related_ticker: Option<String>,
    pub critical: bool,
}

impl NewsItem {
    #[cfg(test)]
    pub fn test_item(id: u64, headline: &str) -> Self {
        Self {
            id,
            date: TurnDate::new(2020, 1),
            headline: headline.to_string(),
            category: NewsCategory::Market,
            related_ticker: None,
            critical: false,
        }
    }
}

// `{ticker}`, `{name}` and `{sector}` are filled from a random instrument.
const TEMPLATES: &[(NewsCategory, &str)] = &[
    (NewsCategory::Market, "Stocks rally as investors shrug off rate worries"),
    (NewsCategory::Market, "Volatility spikes as traders rush for the exits"),
    (NewsCategory::Market, "Markets drift sideways in thin holiday trading"),
    (NewsCategory::Market, "Retail investors pile into momentum names"),
    (NewsCategory::Company, "{name} ({ticker}) beats earnings expectations"),
    (NewsCategory::Company, "{name} ({ticker}) misses on revenue, guides lower"),
    (NewsCategory::Company, "{name} announces major share buyback"),
    (NewsCategory::Company, "Analysts upgrade {ticker} to outperform"),
    (NewsCategory::Company, "Regulators open probe into {name}"),
    (NewsCategory::Company, "{sector} names slide as {ticker} warns on margins"),
    (NewsCategory::Economy, "Central bank holds rates steady"),
    (NewsCategory::Economy, "Inflation cools more than expected"),
    (NewsCategory::Economy, "Jobs report surprises to the upside"),
    (NewsCategory::Economy, "Manufacturing activity contracts for a third month"),
    (NewsCategory::Politics, "Lawmakers reach last-minute budget deal"),
    (NewsCategory::Politics, "New trade tariffs rattle exporters"),
    (NewsCategory::Politics, "Election uncertainty weighs on sentiment"),
];

fn needs_instrument(template: &str) -> bool {
    template.contains('{')
}

/// Hands out headlines with monotonically increasing ids for one run.
#[derive(Debug, Clone)]
pub struct NewsDesk {
    next_id: u64,
}

impl Default for NewsDesk {
    fn default() -> Self {
        Self::new()
    }
}

impl NewsDesk {
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Rolls this month's headline, if any.
    pub fn roll(&mut self, date: TurnDate, book: &InstrumentBook, rng: &mut dyn RngCore) -> Option<NewsItem> {
        if rng.gen_range(0.0..1.0) >= HEADLINE_CHANCE {
            return None;
        }

        let candidates: Vec<&(NewsCategory, &str)> = TEMPLATES
            .iter()
            .filter(|(_, t)| !book.is_empty() || !needs_instrument(t))
            .collect();
        let (category, template) = *candidates[rng.gen_range(0..candidates.len())];

        let (headline, related_ticker) = if needs_instrument(template) {
            let idx = rng.gen_range(0..book.len());
            let inst = &book.as_slice()[idx];
            let text = template
                .replace("{ticker}", &inst.ticker)
                .replace("{name}", &inst.name)
                .replace("{sector}", &inst.sector);
            (text, Some(inst.ticker.clone()))
        } else {
            (template.to_string(), None)
        };

        let critical = rng.gen_range(0.0..1.0) < CRITICAL_CHANCE;
        let item = NewsItem {
            id: self.take_id(),
            date,
            headline,
            category,
            related_ticker,
            critical,
        };
        debug!(target: "arena::news", id = item.id, critical, "{}", item.headline);
        Some(item)
    }

    /// The critical headline announcing a historical event.
    pub fn event_headline(&mut self, date: TurnDate, event: &HistoricalEvent) -> NewsItem {
        let headline = if event.description.is_empty() {
            format!("BREAKING: {}", event.name)
        } else {
            format!("BREAKING: {} - {}", event.name, event.description)
        };
        NewsItem {
            id: self.take_id(),
            date,
            headline,
            category: NewsCategory::Event,
            related_ticker: None,
            critical: true,
        }
    }
}

/// Prepends `item`, evicting the oldest beyond [`NEWS_CAP`].
pub fn push_recent(recent: &mut Vec<NewsItem>, item: NewsItem) {
    recent.insert(0, item);
    recent.truncate(NEWS_CAP);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventEffect;
    use crate::stocks::InstrumentSpec;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn book() -> InstrumentBook {
        InstrumentBook::from_specs(&[
            InstrumentSpec::new("AAPL", "Apple Inc.", "Technology", 195.0, 3.0),
            InstrumentSpec::new("XOM", "Exxon Mobil", "Energy", 110.0, 2.0),
        ])
    }

    #[test]
    fn headline_rates_match_the_configured_chances() {
        // Arrange
        let mut desk = NewsDesk::new();
        let mut rng = StdRng::seed_from_u64(7);
        let book = book();
        let trials = 20_000;

        // Act
        let items: Vec<NewsItem> = (0..trials)
            .filter_map(|_| desk.roll(TurnDate::new(2020, 1), &book, &mut rng))
            .collect();

        // Assert
        let headline_rate = items.len() as f64 / trials as f64;
        let critical_rate = items.iter().filter(|n| n.critical).count() as f64 / items.len() as f64;
        assert!((headline_rate - HEADLINE_CHANCE).abs() < 0.02, "rate {}", headline_rate);
        assert!((critical_rate - CRITICAL_CHANCE).abs() < 0.02, "rate {}", critical_rate);
    }

    #[test]
    fn ids_increase_and_placeholders_are_filled() {
        let mut desk = NewsDesk::new();
        let mut rng = StdRng::seed_from_u64(11);
        let book = book();

        let items: Vec<NewsItem> = (0..500)
            .filter_map(|_| desk.roll(TurnDate::new(2021, 6), &book, &mut rng))
            .collect();

        assert!(items.windows(2).all(|w| w[0].id < w[1].id));
        for item in &items {
            assert!(!item.headline.contains('{'), "unfilled: {}", item.headline);
            if let Some(ticker) = &item.related_ticker {
                assert!(book.get_by_ticker(ticker).is_some());
                assert_eq!(item.category, NewsCategory::Company);
            }
        }
        assert!(items.iter().any(|n| n.related_ticker.is_some()));
    }

    #[test]
    fn empty_roster_only_gets_general_news() {
        let mut desk = NewsDesk::new();
        let mut rng = StdRng::seed_from_u64(3);
        let empty = InstrumentBook::default();

        for _ in 0..200 {
            if let Some(item) = desk.roll(TurnDate::new(2020, 1), &empty, &mut rng) {
                assert!(item.related_ticker.is_none());
            }
        }
    }

    #[test]
    fn recent_list_is_newest_first_and_capped() {
        let mut recent = Vec::new();
        for id in 1..=(NEWS_CAP as u64 + 3) {
            push_recent(&mut recent, NewsItem::test_item(id, "x"));
        }
        assert_eq!(recent.len(), NEWS_CAP);
        assert_eq!(recent[0].id, NEWS_CAP as u64 + 3);
        assert_eq!(recent.last().unwrap().id, 4);
    }

    #[test]
    fn event_headlines_are_critical() {
        let mut desk = NewsDesk::new();
        let event = HistoricalEvent {
            id: "gfc".into(),
            name: "Global Financial Crisis".into(),
            description: "Lehman Brothers collapses".into(),
            date: TurnDate::new(2008, 9),
            duration: 6,
            effects: vec![EventEffect::market(-40.0)],
        };

        let item = desk.event_headline(TurnDate::new(2008, 9), &event);

        assert!(item.critical);
        assert_eq!(item.category, NewsCategory::Event);
        assert_eq!(item.headline, "BREAKING: Global Financial Crisis - Lehman Brothers collapses");
        assert_eq!(item.id, 1);
    }
}
