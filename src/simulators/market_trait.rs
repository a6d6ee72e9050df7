// src/simulators/market_trait.rs

use crate::events::HistoricalEvent;
use crate::stocks::{Candle, Instrument};
use crate::types::TurnDate;
use rand::RngCore;

/// Outcome of evolving one instrument by one turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceMove {
    pub price: f64,
    pub change_percent: f64,
    pub candle: Candle,
}

/// A trait for anything that can evolve market prices by one turn.
/// This allows for a pluggable price model inside the engine.
pub trait MarketModel: Send {
    /// The shared market trend (in percent) for this turn, including any
    /// market-wide term from the active event.
    fn market_trend(&self, active_event: Option<&HistoricalEvent>, rng: &mut dyn RngCore) -> f64;

    /// Evolves one instrument given the shared trend.
    fn evolve(
        &self,
        instrument: &Instrument,
        market_trend: f64,
        active_event: Option<&HistoricalEvent>,
        date: TurnDate,
        rng: &mut dyn RngCore,
    ) -> PriceMove;

    /// Evolves the market index using only the shared trend.
    fn evolve_index(&self, index: f64, market_trend: f64) -> f64;
}
