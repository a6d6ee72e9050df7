// src/simulators/market_model.rs

use super::market_trait::{MarketModel, PriceMove};
use crate::events::HistoricalEvent;
use crate::stocks::{Candle, Instrument};
use crate::types::TurnDate;
use rand::RngCore;
use rand_distr::{Distribution, Uniform};

/// Prices never go below this. Keeps percent math finite for micro-priced coins.
pub const PRICE_FLOOR: f64 = 1e-6;
/// How strongly an instrument follows the shared trend.
pub const TREND_COUPLING: f64 = 0.7;
/// Average monthly drift of the whole market, in percent.
pub const MARKET_DRIFT_PCT: f64 = 0.5;
/// Half-width of the monthly market shock, in percent.
pub const MARKET_VOLATILITY_PCT: f64 = 4.0;
/// Upper bound of the wick added above/below the candle body.
pub const CANDLE_WICK_PCT: f64 = 2.0;

/// Percent-based random walk: every instrument follows a shared trend plus
/// its own noise scaled by its volatility.
#[derive(Debug, Clone)]
pub struct TrendFollowingModel {
    pub coupling: f64,
    pub drift: f64,
    pub market_volatility: f64,
    pub wick: f64,
}

impl Default for TrendFollowingModel {
    fn default() -> Self {
        Self {
            coupling: TREND_COUPLING,
            drift: MARKET_DRIFT_PCT,
            market_volatility: MARKET_VOLATILITY_PCT,
            wick: CANDLE_WICK_PCT,
        }
    }
}

fn centered_noise(rng: &mut dyn RngCore) -> f64 {
    Uniform::new(-0.5, 0.5).sample(rng)
}

/// Applies a percent change, clamping to the floor.
#[inline]
pub fn apply_percent(value: f64, pct: f64) -> f64 {
    (value * (1.0 + pct / 100.0)).max(PRICE_FLOOR)
}

impl MarketModel for TrendFollowingModel {
    fn market_trend(&self, active_event: Option<&HistoricalEvent>, rng: &mut dyn RngCore) -> f64 {
        let base = self.drift + centered_noise(rng) * self.market_volatility * 2.0;
        base + active_event.map_or(0.0, |e| e.market_term())
    }

    fn evolve(
        &self,
        instrument: &Instrument,
        market_trend: f64,
        active_event: Option<&HistoricalEvent>,
        date: TurnDate,
        rng: &mut dyn RngCore,
    ) -> PriceMove {
        let mut pct = self.coupling * market_trend + centered_noise(rng) * instrument.volatility * 2.0;
        if let Some(event) = active_event {
            pct += event.sector_term(&instrument.sector);
        }

        let open = instrument.price;
        let close = apply_percent(open, pct);
        let wick = Uniform::new_inclusive(0.0, self.wick / 100.0);
        let high = open.max(close) * (1.0 + wick.sample(rng));
        let low = (open.min(close) * (1.0 - wick.sample(rng))).max(PRICE_FLOOR);

        PriceMove {
            price: close,
            change_percent: (close - open) / open * 100.0,
            candle: Candle {
                date,
                open,
                high,
                low,
                close,
            },
        }
    }

    fn evolve_index(&self, index: f64, market_trend: f64) -> f64 {
        apply_percent(index, market_trend)
    }
}
