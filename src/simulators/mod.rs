// src/simulators/mod.rs

pub mod market_model;
pub mod market_trait;

pub use market_model::{PRICE_FLOOR, TrendFollowingModel};
pub use market_trait::{MarketModel, PriceMove};
