// src/agents/trader.rs

use crate::stocks::InstrumentBook;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Who an agent is, as listed in a mode configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    /// Decision provider tag (e.g. "openai"). Agents whose tag has no
    /// registered provider trade on the local fallback policy.
    pub provider: String,
    /// Free-text personality; also drives the fallback policy.
    pub personality: String,
    pub color: String,
    #[serde(default)]
    pub avatar: String,
}

impl AgentSpec {
    pub fn new(name: &str, provider: &str, personality: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            provider: provider.to_string(),
            personality: personality.to_string(),
            color: color.to_string(),
            avatar: String::new(),
        }
    }
}

/// An open position. `shares` is always positive; empty positions are removed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub shares: u64,
    pub avg_cost: f64,
}

/// A competing participant and its book.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trader {
    pub id: u64,
    pub name: String,
    pub provider: String,
    pub personality: String,
    pub color: String,
    pub avatar: String,
    pub starting_cash: f64,
    pub cash: f64,
    pub net_worth: f64,
    /// Instrument id -> position.
    pub holdings: BTreeMap<u64, Holding>,
    pub thinking_text: String,
    pub last_action_text: String,
    /// Set only while this agent's decision call is outstanding.
    pub is_active: bool,
    pub total_trades: u64,
    pub realized_pnl: f64,
}

impl Trader {
    pub fn new(id: u64, spec: &AgentSpec, starting_cash: f64) -> Self {
        Self {
            id,
            name: spec.name.clone(),
            provider: spec.provider.clone(),
            personality: spec.personality.clone(),
            color: spec.color.clone(),
            avatar: spec.avatar.clone(),
            starting_cash,
            cash: starting_cash,
            net_worth: starting_cash,
            holdings: BTreeMap::new(),
            thinking_text: String::new(),
            last_action_text: "HOLD".to_string(),
            is_active: false,
            total_trades: 0,
            realized_pnl: 0.0,
        }
    }

    /// Market value of all positions at current prices.
    pub fn holdings_value(&self, book: &InstrumentBook) -> f64 {
        self.holdings
            .iter()
            .map(|(id, h)| h.shares as f64 * book.price_of(*id).unwrap_or(0.0))
            .sum()
    }

    /// cash + Σ shares × price.
    pub fn recompute_net_worth(&mut self, book: &InstrumentBook) -> f64 {
        self.net_worth = self.cash + self.holdings_value(book);
        self.net_worth
    }

    pub fn return_pct(&self) -> f64 {
        if self.starting_cash <= 0.0 {
            return 0.0;
        }
        (self.net_worth - self.starting_cash) / self.starting_cash * 100.0
    }
}
