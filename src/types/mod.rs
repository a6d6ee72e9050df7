// src/types/mod.rs

pub mod calendar;
pub mod trade;

pub use calendar::TurnDate;
pub use trade::{Side, TradeAction, TradeMarker, TradeReport};
