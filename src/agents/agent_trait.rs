// src/agents/agent_trait.rs

use super::config::{CONTEXT_HEADLINES, CONTEXT_TOP_MOVERS};
use super::trader::Trader;
use crate::error::ProviderError;
use crate::news::NewsItem;
use crate::stocks::InstrumentBook;
use crate::types::TurnDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One instrument's move this turn, as shown to an agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mover {
    pub ticker: String,
    pub name: String,
    pub sector: String,
    pub price: f64,
    pub change_percent: f64,
}

/// A position resolved to ticker and current price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextHolding {
    pub ticker: String,
    pub shares: u64,
    pub avg_cost: f64,
    pub price: f64,
}

impl ContextHolding {
    /// Unrealized gain in percent against the average cost.
    pub fn profit_percent(&self) -> f64 {
        if self.avg_cost <= 0.0 {
            return 0.0;
        }
        (self.price - self.avg_cost) / self.avg_cost * 100.0
    }
}

/// A read-only snapshot given to an agent for one decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketContext {
    pub date: TurnDate,
    pub index_name: String,
    pub index_level: f64,
    pub index_change_percent: f64,
    pub cash: f64,
    pub net_worth: f64,
    pub holdings: Vec<ContextHolding>,
    /// Best performers first.
    pub top_gainers: Vec<Mover>,
    /// Worst performers first.
    pub top_losers: Vec<Mover>,
    pub headlines: Vec<String>,
    pub active_event: Option<String>,
}

/// Everything the context builder reads, borrowed from the engine's state.
pub struct ContextInputs<'a> {
    pub date: TurnDate,
    pub index_name: &'a str,
    pub index_level: f64,
    pub index_change_percent: f64,
    pub instruments: &'a InstrumentBook,
    pub news: &'a [NewsItem],
    pub active_event: Option<&'a str>,
}

impl MarketContext {
    pub fn build(trader: &Trader, inputs: &ContextInputs<'_>) -> Self {
        let mut movers: Vec<Mover> = inputs
            .instruments
            .iter()
            .map(|inst| Mover {
                ticker: inst.ticker.clone(),
                name: inst.name.clone(),
                sector: inst.sector.clone(),
                price: inst.price,
                change_percent: inst.change_percent(),
            })
            .collect();
        movers.sort_by(|a, b| {
            b.change_percent
                .partial_cmp(&a.change_percent)
                .unwrap_or(Ordering::Equal)
        });

        let top_gainers: Vec<Mover> = movers
            .iter()
            .filter(|m| m.change_percent > 0.0)
            .take(CONTEXT_TOP_MOVERS)
            .cloned()
            .collect();
        let top_losers: Vec<Mover> = movers
            .iter()
            .rev()
            .filter(|m| m.change_percent < 0.0)
            .take(CONTEXT_TOP_MOVERS)
            .cloned()
            .collect();

        let holdings = trader
            .holdings
            .iter()
            .filter_map(|(id, h)| {
                inputs.instruments.get_by_id(*id).map(|inst| ContextHolding {
                    ticker: inst.ticker.clone(),
                    shares: h.shares,
                    avg_cost: h.avg_cost,
                    price: inst.price,
                })
            })
            .collect();

        Self {
            date: inputs.date,
            index_name: inputs.index_name.to_string(),
            index_level: inputs.index_level,
            index_change_percent: inputs.index_change_percent,
            cash: trader.cash,
            net_worth: trader.net_worth,
            holdings,
            top_gainers,
            top_losers,
            headlines: inputs
                .news
                .iter()
                .take(CONTEXT_HEADLINES)
                .map(|n| n.headline.clone())
                .collect(),
            active_event: inputs.active_event.map(str::to_string),
        }
    }
}

/// Who is asking, as seen by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentIdentity {
    pub name: String,
    pub personality: String,
}

/// A provider's answer. `action` is `HOLD`, `BUY <TICKER> <N>` or `SELL <TICKER> <N>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(default, alias = "thinking")]
    pub thinking_text: String,
    pub action: String,
    #[serde(default, alias = "reasoning")]
    pub reasoning_text: String,
}

impl Decision {
    pub fn hold(thinking: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            thinking_text: thinking.into(),
            action: "HOLD".to_string(),
            reasoning_text: reasoning.into(),
        }
    }
}

/// The capability that turns a market snapshot into a trading decision.
///
/// Implementations may block (network calls); the engine bounds every call
/// with a timeout and replaces any error with the local fallback policy.
pub trait DecisionProvider: Send + Sync {
    fn name(&self) -> &str;

    fn decide(
        &self,
        agent: &AgentIdentity,
        context: &MarketContext,
    ) -> Result<Decision, ProviderError>;
}
