// src/modes.rs

//! Mode configuration: which universe a simulation runs.
//!
//! A mode fixes the calendar window, the instrument roster, the competing
//! agents and their starting cash, and the scheduled historical events. Two
//! modes ship built in ("stocks" and "crypto"); others load from JSON.

use crate::agents::config::DEFAULT_PROVIDER_TIMEOUT;
use crate::agents::trader::AgentSpec;
use crate::error::ConfigError;
use crate::events::{EventEffect, HistoricalEvent};
use crate::stocks::InstrumentSpec;
use crate::types::TurnDate;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeConfig {
    pub name: String,
    pub start: TurnDate,
    /// Last month that is still played.
    pub end: TurnDate,
    pub index_name: String,
    pub index_base: f64,
    pub starting_cash: f64,
    pub instruments: Vec<InstrumentSpec>,
    pub agents: Vec<AgentSpec>,
    #[serde(default)]
    pub events: Vec<HistoricalEvent>,
}

impl ModeConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let mode: ModeConfig = serde_json::from_str(json)?;
        mode.validate()?;
        Ok(mode)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Number of ticks a full run processes.
    pub fn total_turns(&self) -> u32 {
        self.start.months_until(&self.end).max(0) as u32
    }

    /// Rejects configurations the engine cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| Err(ConfigError::invalid(&self.name, reason));

        if !self.start.is_valid() || !self.end.is_valid() {
            return invalid(format!("bad calendar window {:?} to {:?}", self.start, self.end));
        }
        if self.end <= self.start {
            return invalid(format!("end {} is not after start {}", self.end, self.start));
        }
        if !(self.index_base > 0.0) {
            return invalid(format!("index base must be positive, got {}", self.index_base));
        }
        if !(self.starting_cash > 0.0) {
            return invalid(format!("starting cash must be positive, got {}", self.starting_cash));
        }
        if self.instruments.is_empty() {
            return invalid("no instruments".to_string());
        }
        if self.agents.is_empty() {
            return invalid("no agents".to_string());
        }

        let mut seen = HashSet::new();
        for spec in &self.instruments {
            if spec.ticker.trim().is_empty() || spec.ticker.contains(char::is_whitespace) {
                return invalid(format!("bad ticker {:?}", spec.ticker));
            }
            if spec.ticker != spec.ticker.to_ascii_uppercase() {
                return invalid(format!("ticker {} must be upper case", spec.ticker));
            }
            if !seen.insert(spec.ticker.as_str()) {
                return invalid(format!("duplicate ticker {}", spec.ticker));
            }
            if !(spec.initial_price > 0.0) {
                return invalid(format!("{} has non-positive price {}", spec.ticker, spec.initial_price));
            }
            if !(spec.volatility >= 0.0) {
                return invalid(format!("{} has negative volatility", spec.ticker));
            }
        }

        for event in &self.events {
            if !event.date.is_valid() {
                return invalid(format!("event {} has a bad date", event.id));
            }
            // the first tick is the month after start
            if event.date <= self.start || event.date > self.end {
                return invalid(format!(
                    "event {} dated {} falls outside {}..={}",
                    event.id,
                    event.date,
                    self.start.next(),
                    self.end
                ));
            }
        }
        Ok(())
    }
}

/// Runtime knobs that are not part of a mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Wall-clock time per simulated month.
    pub tick_interval: Duration,
    /// Pause between the end of a run and the next one.
    pub restart_delay: Duration,
    /// How long a breaking headline stays up.
    pub breaking_news_ttl: Duration,
    pub provider_timeout: Duration,
    /// Fixed seed for reproducible runs; entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(2),
            restart_delay: Duration::from_secs(10),
            breaking_news_ttl: Duration::from_secs(8),
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            seed: None,
        }
    }
}

fn default_agents() -> Vec<AgentSpec> {
    vec![
        AgentSpec::new("Atlas", "openai", "Aggressive momentum trader who chases breakouts", "#10a37f"),
        AgentSpec::new("Sage", "anthropic", "Cautious value investor who buys quality on the dip", "#d97757"),
        AgentSpec::new("Gemma", "google", "Technical analyst reading chart patterns and trend lines", "#4285f4"),
        AgentSpec::new("Lux", "xai", "Bold contrarian with a taste for speculative bets", "#e4e4e7"),
        AgentSpec::new("Mistral", "mistral", "Balanced generalist spreading risk across sectors", "#ff7000"),
        AgentSpec::new("Deep", "deepseek", "Quant trader following indicators and momentum", "#536dfe"),
    ]
}

fn event(id: &str, name: &str, description: &str, date: TurnDate, duration: u32, effects: Vec<EventEffect>) -> HistoricalEvent {
    HistoricalEvent {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        date,
        duration,
        effects,
    }
}

fn stocks_mode() -> ModeConfig {
    let ym = TurnDate::new;
    ModeConfig {
        name: "stocks".to_string(),
        start: ym(2000, 1),
        end: ym(2024, 12),
        index_name: "S&P 500".to_string(),
        index_base: 1469.25,
        starting_cash: 100_000.0,
        instruments: vec![
            InstrumentSpec::new("AAPL", "Apple Inc.", "Technology", 3.99, 3.5).with_fundamentals(16.0e9, 28.0, 0.0),
            InstrumentSpec::new("MSFT", "Microsoft Corp.", "Technology", 58.28, 3.0).with_fundamentals(604.0e9, 58.0, 0.0),
            InstrumentSpec::new("INTC", "Intel Corp.", "Technology", 43.50, 3.0).with_fundamentals(290.0e9, 40.0, 0.2),
            InstrumentSpec::new("JPM", "JPMorgan Chase & Co.", "Finance", 48.00, 2.5).with_fundamentals(95.0e9, 12.0, 2.8),
            InstrumentSpec::new("GS", "Goldman Sachs Group", "Finance", 94.00, 3.0).with_fundamentals(45.0e9, 14.0, 0.5),
            InstrumentSpec::new("JNJ", "Johnson & Johnson", "Healthcare", 46.63, 1.5).with_fundamentals(130.0e9, 25.0, 1.4),
            InstrumentSpec::new("PFE", "Pfizer Inc.", "Healthcare", 32.44, 2.0).with_fundamentals(205.0e9, 40.0, 1.0),
            InstrumentSpec::new("XOM", "Exxon Mobil Corp.", "Energy", 40.19, 2.0).with_fundamentals(280.0e9, 18.0, 2.2),
            InstrumentSpec::new("CVX", "Chevron Corp.", "Energy", 43.31, 2.0).with_fundamentals(57.0e9, 16.0, 3.0),
            InstrumentSpec::new("KO", "Coca-Cola Co.", "Consumer", 29.13, 1.2).with_fundamentals(143.0e9, 35.0, 1.2),
            InstrumentSpec::new("WMT", "Walmart Inc.", "Consumer", 23.04, 1.5).with_fundamentals(307.0e9, 45.0, 0.4),
            InstrumentSpec::new("GE", "General Electric", "Industrial", 51.56, 2.5).with_fundamentals(507.0e9, 40.0, 1.1),
        ],
        agents: default_agents(),
        events: vec![
            event("dotcom", "Dot-com Bust", "The tech bubble deflates", ym(2000, 4), 24,
                vec![EventEffect::market(-25.0), EventEffect::sector("Technology", -60.0)]),
            event("sept11", "September 11 Attacks", "Markets close for four days", ym(2001, 9), 2,
                vec![EventEffect::market(-12.0)]),
            event("gfc", "Global Financial Crisis", "Lehman Brothers files for bankruptcy", ym(2008, 9), 6,
                vec![EventEffect::market(-40.0), EventEffect::sector("Finance", -35.0)]),
            event("oil2014", "Oil Price Collapse", "OPEC refuses to cut output", ym(2014, 11), 12,
                vec![EventEffect::sector("Energy", -40.0)]),
            event("covid", "COVID-19 Crash", "A pandemic shuts down the global economy", ym(2020, 3), 2,
                vec![EventEffect::market(-30.0), EventEffect::sector("Healthcare", 10.0)]),
            event("stimulus", "Stimulus Rally", "Zero rates and stimulus send stocks soaring", ym(2020, 5), 8,
                vec![EventEffect::market(25.0), EventEffect::sector("Technology", 30.0)]),
            event("hikes2022", "Rate Hike Cycle", "The Fed raises rates at the fastest pace in decades", ym(2022, 1), 10,
                vec![EventEffect::market(-20.0), EventEffect::sector("Technology", -25.0), EventEffect::sector("Energy", 30.0)]),
        ],
    }
}

fn crypto_mode() -> ModeConfig {
    let ym = TurnDate::new;
    ModeConfig {
        name: "crypto".to_string(),
        start: ym(2015, 1),
        end: ym(2024, 12),
        index_name: "Crypto Index".to_string(),
        index_base: 1000.0,
        starting_cash: 10_000.0,
        instruments: vec![
            InstrumentSpec::new("BTC", "Bitcoin", "Store of Value", 315.0, 12.0).with_fundamentals(4.3e9, 0.0, 0.0),
            InstrumentSpec::new("ETH", "Ethereum", "Smart Contracts", 1.0, 18.0),
            InstrumentSpec::new("XRP", "XRP", "Payments", 0.024, 16.0).with_fundamentals(0.75e9, 0.0, 0.0),
            InstrumentSpec::new("LTC", "Litecoin", "Payments", 2.14, 15.0).with_fundamentals(0.09e9, 0.0, 0.0),
            InstrumentSpec::new("DOGE", "Dogecoin", "Meme", 0.0002, 25.0).with_fundamentals(0.02e9, 0.0, 0.0),
            InstrumentSpec::new("BNB", "BNB", "Exchange", 0.1, 18.0),
            InstrumentSpec::new("ADA", "Cardano", "Smart Contracts", 0.02, 20.0),
            InstrumentSpec::new("LINK", "Chainlink", "DeFi", 0.15, 20.0),
        ],
        agents: default_agents(),
        events: vec![
            event("halving2016", "Bitcoin Halving", "Block rewards are cut in half", ym(2016, 7), 6,
                vec![EventEffect::sector("Store of Value", 40.0)]),
            event("icoboom", "ICO Mania", "Token sales raise billions overnight", ym(2017, 9), 4,
                vec![EventEffect::market(150.0), EventEffect::sector("Smart Contracts", 100.0)]),
            event("winter2018", "Crypto Winter", "The bubble bursts and prices collapse", ym(2018, 1), 12,
                vec![EventEffect::market(-80.0)]),
            event("covid", "COVID-19 Crash", "Liquidity dries up across every market", ym(2020, 3), 1,
                vec![EventEffect::market(-40.0)]),
            event("defisummer", "DeFi Summer", "Yield farming takes off", ym(2020, 6), 4,
                vec![EventEffect::sector("DeFi", 120.0)]),
            event("bull2021", "Institutional Bull Run", "Corporations add bitcoin to their balance sheets", ym(2020, 11), 6,
                vec![EventEffect::market(120.0), EventEffect::sector("Meme", 300.0)]),
            event("terra", "Terra Collapse", "An algorithmic stablecoin unravels", ym(2022, 5), 2,
                vec![EventEffect::market(-45.0)]),
            event("ftx", "FTX Bankruptcy", "A top exchange halts withdrawals", ym(2022, 11), 2,
                vec![EventEffect::market(-25.0), EventEffect::sector("Exchange", -30.0)]),
            event("etf2024", "Spot ETF Approval", "Regulators approve spot bitcoin ETFs", ym(2024, 1), 3,
                vec![EventEffect::market(30.0), EventEffect::sector("Store of Value", 40.0)]),
        ],
    }
}

lazy_static! {
    static ref BUILTIN_MODES: BTreeMap<&'static str, ModeConfig> = {
        let mut m = BTreeMap::new();
        m.insert("stocks", stocks_mode());
        m.insert("crypto", crypto_mode());
        m
    };
}

/// A fresh copy of a built-in mode.
pub fn builtin(name: &str) -> Result<ModeConfig, ConfigError> {
    BUILTIN_MODES
        .get(name)
        .cloned()
        .ok_or_else(|| ConfigError::UnknownMode(name.to_string()))
}

pub fn builtin_names() -> Vec<&'static str> {
    BUILTIN_MODES.keys().copied().collect()
}
