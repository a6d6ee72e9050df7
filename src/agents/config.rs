// src/agents/config.rs

//! A centralized place for tuning agent behavior parameters.

use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

// --- Fallback heuristic: action odds per personality ---
pub const AGGRESSIVE_BUY_CHANCE: f64 = 0.5;
pub const CONSERVATIVE_BUY_CHANCE: f64 = 0.25;
pub const DEFAULT_BUY_CHANCE: f64 = 0.35;
pub const AGGRESSIVE_SELL_CHANCE: f64 = 0.3;
pub const CONSERVATIVE_SELL_CHANCE: f64 = 0.15;
pub const DEFAULT_SELL_CHANCE: f64 = 0.2;

// --- Fallback heuristic: sizing ---
/// Agents at or below this much cash never buy.
pub const MIN_CASH_FOR_BUY: f64 = 1_000.0;
/// Share of cash a single buy may use when computing max affordable shares.
pub const MAX_POSITION_FRACTION: f64 = 0.1;
/// Every fallback buy asks for at least this many shares.
pub const MIN_BUY_SHARES: u64 = 100;
/// Buy size = max affordable × (BUY_SIZE_BASE + uniform(0, BUY_SIZE_SPREAD)).
pub const BUY_SIZE_BASE: f64 = 0.3;
pub const BUY_SIZE_SPREAD: f64 = 0.5;
/// Sell size = held × (SELL_SIZE_BASE + uniform(0, SELL_SIZE_SPREAD)).
pub const SELL_SIZE_BASE: f64 = 0.3;
pub const SELL_SIZE_SPREAD: f64 = 0.4;
/// Take profit above this unrealized gain, in percent.
pub const TAKE_PROFIT_PCT: f64 = 10.0;
/// Cut losses below this unrealized gain, in percent.
pub const STOP_LOSS_PCT: f64 = -15.0;
/// Odds an aggressive agent sells a position that hit neither threshold.
pub const AGGRESSIVE_SELL_COIN: f64 = 0.5;

// --- Market context ---
pub const CONTEXT_TOP_MOVERS: usize = 5;
pub const CONTEXT_HEADLINES: usize = 5;

// --- Remote provider ---
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const PROVIDER_TEMPERATURE: f32 = 0.7;
pub const PROVIDER_MAX_TOKENS: u32 = 400;

/// Env var that switches every engine in the process to the local policy.
pub const SIMULATION_ONLY_ENV: &str = "ARENA_SIMULATION_ONLY";

static SIMULATION_ONLY: Lazy<AtomicBool> = Lazy::new(|| {
    let on = std::env::var(SIMULATION_ONLY_ENV)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    AtomicBool::new(on)
});

/// When set, remote providers are never called.
pub fn simulation_only() -> bool {
    SIMULATION_ONLY.load(Ordering::Relaxed)
}

pub fn set_simulation_only(on: bool) {
    SIMULATION_ONLY.store(on, Ordering::Relaxed);
}
