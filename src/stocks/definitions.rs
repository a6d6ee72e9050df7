// src/stocks/definitions.rs
//! Instrument metadata and the per-run instrument arena.
//
//! Instruments are owned by an [`InstrumentBook`] and addressed by id or ticker;
//! nothing outside the engine holds a mutable reference to one.

use crate::types::{TradeMarker, TurnDate};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

pub type Symbol = String;

/// Oldest candles are trimmed once this many are kept.
pub const PRICE_HISTORY_CAP: usize = 240;
/// Oldest markers are trimmed once this many are kept.
pub const TRADE_MARKER_CAP: usize = 100;

/// One month of price action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub date: TurnDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Static facts about an instrument as it appears in a mode configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    /// Exchange ticker (e.g. "AAPL").
    pub ticker: Symbol,
    /// Human-readable name.
    pub name: String,
    pub sector: String,
    /// Price at the first turn of the run.
    pub initial_price: f64,
    /// Per-turn volatility in percent.
    pub volatility: f64,
    #[serde(default)]
    pub market_cap: f64,
    #[serde(default)]
    pub pe_ratio: f64,
    #[serde(default)]
    pub dividend_yield: f64,
}

impl InstrumentSpec {
    #[inline]
    pub fn new<T1: Into<String>, T2: Into<String>, T3: Into<String>>(
        ticker: T1,
        name: T2,
        sector: T3,
        initial_price: f64,
        volatility: f64,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            name: name.into(),
            sector: sector.into(),
            initial_price,
            volatility,
            market_cap: 0.0,
            pe_ratio: 0.0,
            dividend_yield: 0.0,
        }
    }

    pub fn with_fundamentals(mut self, market_cap: f64, pe_ratio: f64, dividend_yield: f64) -> Self {
        self.market_cap = market_cap;
        self.pe_ratio = pe_ratio;
        self.dividend_yield = dividend_yield;
        self
    }
}

/// A tradeable asset with its live price and bounded histories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: u64,
    pub ticker: Symbol,
    pub name: String,
    pub sector: String,
    pub price: f64,
    pub previous_price: f64,
    pub market_cap: f64,
    pub pe_ratio: f64,
    pub dividend_yield: f64,
    pub volatility: f64,
    pub price_history: VecDeque<Candle>,
    pub trade_markers: VecDeque<TradeMarker>,
}

impl Instrument {
    pub fn from_spec(id: u64, spec: &InstrumentSpec) -> Self {
        Self {
            id,
            ticker: spec.ticker.clone(),
            name: spec.name.clone(),
            sector: spec.sector.clone(),
            price: spec.initial_price,
            previous_price: spec.initial_price,
            market_cap: spec.market_cap,
            pe_ratio: spec.pe_ratio,
            dividend_yield: spec.dividend_yield,
            volatility: spec.volatility,
            price_history: VecDeque::new(),
            trade_markers: VecDeque::new(),
        }
    }

    /// Percent change between the previous and the current price.
    pub fn change_percent(&self) -> f64 {
        if self.previous_price <= 0.0 {
            return 0.0;
        }
        (self.price - self.previous_price) / self.previous_price * 100.0
    }

    /// Moves the instrument to `new_price`, keeping the fundamentals in step
    /// and recording the candle.
    pub fn apply_price(&mut self, new_price: f64, candle: Candle) {
        let old_price = self.price;
        let ratio = new_price / old_price;
        self.previous_price = old_price;
        self.price = new_price;
        self.market_cap *= ratio;
        if self.pe_ratio > 0.0 {
            self.pe_ratio *= ratio;
        }
        self.dividend_yield /= ratio;

        self.price_history.push_back(candle);
        while self.price_history.len() > PRICE_HISTORY_CAP {
            self.price_history.pop_front();
        }
    }

    pub fn push_marker(&mut self, marker: TradeMarker) {
        self.trade_markers.push_back(marker);
        while self.trade_markers.len() > TRADE_MARKER_CAP {
            self.trade_markers.pop_front();
        }
    }
}

/// Arena of the instruments in one run, with a ticker index for fast lookups.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InstrumentBook {
    instruments: Vec<Instrument>,
    #[serde(skip)]
    ticker_to_index: HashMap<Symbol, usize>,
}

impl InstrumentBook {
    /// Builds the book from specs. Ids are assigned in roster order starting at 1.
    pub fn from_specs(specs: &[InstrumentSpec]) -> Self {
        let instruments = specs
            .iter()
            .enumerate()
            .map(|(i, spec)| Instrument::from_spec(i as u64 + 1, spec))
            .collect();
        Self::from_instruments(instruments)
    }

    pub fn from_instruments(instruments: Vec<Instrument>) -> Self {
        let ticker_to_index = instruments
            .iter()
            .enumerate()
            .map(|(i, inst)| (inst.ticker.clone(), i))
            .collect();
        Self {
            instruments,
            ticker_to_index,
        }
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Instrument> {
        self.instruments.iter_mut()
    }

    pub fn as_slice(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn get_by_ticker(&self, ticker: &str) -> Option<&Instrument> {
        self.ticker_to_index
            .get(ticker)
            .map(|&i| &self.instruments[i])
    }

    pub fn get_by_ticker_mut(&mut self, ticker: &str) -> Option<&mut Instrument> {
        match self.ticker_to_index.get(ticker) {
            Some(&i) => self.instruments.get_mut(i),
            None => None,
        }
    }

    pub fn get_by_id(&self, id: u64) -> Option<&Instrument> {
        self.instruments.iter().find(|inst| inst.id == id)
    }

    /// Price of the instrument with the given id, if it exists.
    pub fn price_of(&self, id: u64) -> Option<f64> {
        self.get_by_id(id).map(|inst| inst.price)
    }

    pub fn tickers(&self) -> Vec<Symbol> {
        self.instruments.iter().map(|s| s.ticker.clone()).collect()
    }
}
