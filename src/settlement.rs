// src/settlement.rs

//! Applies one parsed decision to one trader's book.
//!
//! Settlement is all-or-nothing: an order that cannot be filled in full
//! (unknown ticker, not enough cash, not enough shares) changes nothing.
//! Nothing here returns an error; the outcome says what happened.

use crate::agents::trader::{Holding, Trader};
use crate::stocks::InstrumentBook;
use crate::types::{Side, TradeAction, TradeMarker, TradeReport, TurnDate};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    UnknownTicker(String),
    InsufficientCash { needed: f64, available: f64 },
    InsufficientShares { requested: u64, held: u64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::UnknownTicker(t) => write!(f, "unknown ticker {}", t),
            Rejection::InsufficientCash { needed, available } => {
                write!(f, "needs ${:.2}, has ${:.2}", needed, available)
            }
            Rejection::InsufficientShares { requested, held } => {
                write!(f, "wants to sell {} shares, holds {}", requested, held)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Hold,
    Filled(TradeReport),
    Rejected { action: String, reason: Rejection },
}

impl Settlement {
    /// Text shown as the trader's last action.
    pub fn describe(&self) -> String {
        match self {
            Settlement::Hold => "HOLD".to_string(),
            Settlement::Filled(r) => format!("{} {} {} @ ${:.2}", r.side, r.ticker, r.shares, r.price),
            Settlement::Rejected { action, reason } => format!("{} (rejected: {})", action, reason),
        }
    }
}

/// Parses `action` and settles it against `trader` and `book`.
pub fn apply(trader: &mut Trader, action: &str, book: &mut InstrumentBook, date: TurnDate) -> Settlement {
    let (side, ticker, shares) = match TradeAction::parse(action) {
        TradeAction::Hold => return Settlement::Hold,
        TradeAction::Order { side, ticker, shares } => (side, ticker, shares),
    };

    let outcome = match side {
        Side::Buy => buy(trader, &ticker, shares, book, date),
        Side::Sell => sell(trader, &ticker, shares, book, date),
    };

    match outcome {
        Ok(report) => Settlement::Filled(report),
        Err(reason) => {
            debug!(target: "arena::settlement", trader = %trader.name, %action, %reason, "order rejected");
            Settlement::Rejected {
                action: TradeAction::Order { side, ticker, shares }.to_string(),
                reason,
            }
        }
    }
}

fn buy(
    trader: &mut Trader,
    ticker: &str,
    shares: u64,
    book: &mut InstrumentBook,
    date: TurnDate,
) -> Result<TradeReport, Rejection> {
    let instrument = book
        .get_by_ticker_mut(ticker)
        .ok_or_else(|| Rejection::UnknownTicker(ticker.to_string()))?;
    let price = instrument.price;
    let cost = price * shares as f64;
    if cost > trader.cash {
        return Err(Rejection::InsufficientCash {
            needed: cost,
            available: trader.cash,
        });
    }

    trader.cash -= cost;
    trader
        .holdings
        .entry(instrument.id)
        .and_modify(|h| {
            let total = h.shares + shares;
            h.avg_cost = (h.avg_cost * h.shares as f64 + cost) / total as f64;
            h.shares = total;
        })
        .or_insert(Holding {
            shares,
            avg_cost: price,
        });
    trader.total_trades += 1;

    instrument.push_marker(marker(trader, Side::Buy, shares, price, date));
    Ok(report(trader, Side::Buy, ticker, shares, price))
}

fn sell(
    trader: &mut Trader,
    ticker: &str,
    shares: u64,
    book: &mut InstrumentBook,
    date: TurnDate,
) -> Result<TradeReport, Rejection> {
    let instrument = book
        .get_by_ticker_mut(ticker)
        .ok_or_else(|| Rejection::UnknownTicker(ticker.to_string()))?;
    let held = trader.holdings.get(&instrument.id).map_or(0, |h| h.shares);
    if held < shares {
        return Err(Rejection::InsufficientShares {
            requested: shares,
            held,
        });
    }

    let price = instrument.price;
    let proceeds = price * shares as f64;
    trader.cash += proceeds;
    if let Some(h) = trader.holdings.get_mut(&instrument.id) {
        trader.realized_pnl += (price - h.avg_cost) * shares as f64;
        h.shares -= shares;
        if h.shares == 0 {
            trader.holdings.remove(&instrument.id);
        }
    }
    trader.total_trades += 1;

    instrument.push_marker(marker(trader, Side::Sell, shares, price, date));
    Ok(report(trader, Side::Sell, ticker, shares, price))
}

fn marker(trader: &Trader, side: Side, shares: u64, price: f64, date: TurnDate) -> TradeMarker {
    TradeMarker {
        date,
        agent_id: trader.id,
        agent_color: trader.color.clone(),
        side,
        shares,
        price,
    }
}

fn report(trader: &Trader, side: Side, ticker: &str, shares: u64, price: f64) -> TradeReport {
    TradeReport {
        agent_name: trader.name.clone(),
        side,
        ticker: ticker.to_string(),
        shares,
        price,
    }
}

// -----------------------------------------------------------------------------
//  Unit Tests
// -----------------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::trader::AgentSpec;
    use crate::stocks::{Candle, InstrumentSpec};

    const DATE: TurnDate = TurnDate { year: 2020, month: 2 };

    fn setup(cash: f64) -> (Trader, InstrumentBook) {
        let book = InstrumentBook::from_specs(&[
            InstrumentSpec::new("ACME", "Acme Corp", "Industrial", 10.0, 2.0),
            InstrumentSpec::new("GLOBX", "Globex", "Technology", 50.0, 2.0),
        ]);
        let trader = Trader::new(7, &AgentSpec::new("Ada", "local", "balanced", "#123456"), cash);
        (trader, book)
    }

    fn reprice(book: &mut InstrumentBook, ticker: &str, price: f64) {
        let inst = book.get_by_ticker_mut(ticker).unwrap();
        let candle = Candle { date: DATE, open: inst.price, high: price, low: price, close: price };
        inst.apply_price(price, candle);
    }

    fn assert_invariants(trader: &Trader) {
        assert!(trader.cash >= 0.0);
        assert!(trader.holdings.values().all(|h| h.shares > 0));
    }

    #[test]
    fn buy_then_sell_is_cash_neutral() {
        // Arrange
        let (mut trader, mut book) = setup(100_000.0);

        // Act
        let bought = apply(&mut trader, "BUY ACME 100", &mut book, DATE);
        let after_buy = trader.cash;
        let sold = apply(&mut trader, "SELL ACME 100", &mut book, DATE);

        // Assert
        assert!(matches!(bought, Settlement::Filled(_)));
        assert!(matches!(sold, Settlement::Filled(_)));
        assert_eq!(after_buy, 100_000.0 - 1_000.0);
        assert_eq!(trader.cash, 100_000.0);
        assert!(trader.holdings.is_empty());
        assert_eq!(trader.total_trades, 2);
        assert_invariants(&trader);
    }

    #[test]
    fn unaffordable_buy_changes_nothing() {
        let (mut trader, mut book) = setup(999.0);
        let trader_before = trader.clone();
        let markers_before = book.get_by_ticker("ACME").unwrap().trade_markers.clone();

        let outcome = apply(&mut trader, "BUY ACME 100", &mut book, DATE);

        assert!(matches!(
            outcome,
            Settlement::Rejected { reason: Rejection::InsufficientCash { .. }, .. }
        ));
        assert_eq!(trader, trader_before);
        assert_eq!(book.get_by_ticker("ACME").unwrap().trade_markers, markers_before);
    }

    #[test]
    fn exact_cash_is_enough() {
        let (mut trader, mut book) = setup(1_000.0);
        let outcome = apply(&mut trader, "BUY ACME 100", &mut book, DATE);
        assert!(matches!(outcome, Settlement::Filled(_)));
        assert_eq!(trader.cash, 0.0);
        assert_invariants(&trader);
    }

    #[test]
    fn average_cost_is_share_weighted() {
        let (mut trader, mut book) = setup(100_000.0);

        apply(&mut trader, "BUY ACME 100", &mut book, DATE);
        reprice(&mut book, "ACME", 20.0);
        apply(&mut trader, "BUY ACME 100", &mut book, DATE);

        let id = book.get_by_ticker("ACME").unwrap().id;
        let holding = trader.holdings[&id];
        assert_eq!(holding.shares, 200);
        assert!((holding.avg_cost - 15.0).abs() < 1e-9);
        assert_eq!(trader.cash, 100_000.0 - 1_000.0 - 2_000.0);
    }

    #[test]
    fn partial_sell_keeps_cost_basis_and_books_pnl() {
        let (mut trader, mut book) = setup(10_000.0);
        apply(&mut trader, "BUY GLOBX 40", &mut book, DATE);
        reprice(&mut book, "GLOBX", 60.0);

        let outcome = apply(&mut trader, "SELL GLOBX 15", &mut book, DATE);

        let id = book.get_by_ticker("GLOBX").unwrap().id;
        assert_eq!(trader.holdings[&id].shares, 25);
        assert_eq!(trader.holdings[&id].avg_cost, 50.0);
        assert!((trader.realized_pnl - 150.0).abs() < 1e-9);
        match outcome {
            Settlement::Filled(r) => {
                assert_eq!(r.side, Side::Sell);
                assert_eq!(r.shares, 15);
                assert_eq!(r.price, 60.0);
                assert_eq!(r.agent_name, "Ada");
            }
            other => panic!("expected a fill, got {:?}", other),
        }
    }

    #[test]
    fn cannot_sell_more_than_held_or_what_is_not_held() {
        let (mut trader, mut book) = setup(10_000.0);
        apply(&mut trader, "BUY ACME 10", &mut book, DATE);
        let before = trader.clone();

        let over = apply(&mut trader, "SELL ACME 11", &mut book, DATE);
        let none = apply(&mut trader, "SELL GLOBX 1", &mut book, DATE);

        assert!(matches!(
            over,
            Settlement::Rejected { reason: Rejection::InsufficientShares { requested: 11, held: 10 }, .. }
        ));
        assert!(matches!(
            none,
            Settlement::Rejected { reason: Rejection::InsufficientShares { held: 0, .. }, .. }
        ));
        assert_eq!(trader, before);
    }

    #[test]
    fn unknown_and_malformed_actions_are_no_ops() {
        let (mut trader, mut book) = setup(10_000.0);
        let before = trader.clone();

        let unknown = apply(&mut trader, "BUY NOPE 1", &mut book, DATE);
        let garbage = apply(&mut trader, "BUY ACME lots", &mut book, DATE);
        let hold = apply(&mut trader, "HOLD", &mut book, DATE);

        assert!(matches!(unknown, Settlement::Rejected { reason: Rejection::UnknownTicker(_), .. }));
        assert_eq!(garbage, Settlement::Hold);
        assert_eq!(hold, Settlement::Hold);
        assert_eq!(trader, before);
        assert!(book.iter().all(|i| i.trade_markers.is_empty()));
    }

    #[test]
    fn fills_leave_a_marker_on_the_instrument() {
        let (mut trader, mut book) = setup(10_000.0);
        apply(&mut trader, "buy acme 5", &mut book, DATE);

        let markers = &book.get_by_ticker("ACME").unwrap().trade_markers;
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].agent_id, 7);
        assert_eq!(markers[0].agent_color, "#123456");
        assert_eq!(markers[0].side, Side::Buy);
        assert_eq!(markers[0].shares, 5);
        assert_eq!(markers[0].date, DATE);
    }

    #[test]
    fn describe_reports_outcomes() {
        let (mut trader, mut book) = setup(100.0);
        assert_eq!(apply(&mut trader, "BUY ACME 5", &mut book, DATE).describe(), "BUY ACME 5 @ $10.00");
        assert_eq!(
            apply(&mut trader, "BUY ACME 500", &mut book, DATE).describe(),
            "BUY ACME 500 (rejected: needs $5000.00, has $50.00)"
        );
    }
}
