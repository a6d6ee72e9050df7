// src/types/trade.rs

use super::calendar::TurnDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// A parsed action string.
///
/// Providers answer with free text of the form `HOLD`, `BUY <TICKER> <N>` or
/// `SELL <TICKER> <N>`. Anything that does not fit is treated as `Hold`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeAction {
    Hold,
    Order {
        side: Side,
        ticker: String,
        shares: u64,
    },
}

impl TradeAction {
    pub fn parse(action: &str) -> Self {
        let mut parts = action.split_whitespace();
        let side = match parts.next().map(|verb| verb.to_ascii_uppercase()) {
            Some(verb) if verb == "BUY" => Side::Buy,
            Some(verb) if verb == "SELL" => Side::Sell,
            _ => return TradeAction::Hold,
        };
        let (Some(ticker), Some(shares), None) = (parts.next(), parts.next(), parts.next()) else {
            return TradeAction::Hold;
        };
        match shares.parse::<u64>() {
            Ok(shares) if shares > 0 => TradeAction::Order {
                side,
                ticker: ticker.to_ascii_uppercase(),
                shares,
            },
            _ => TradeAction::Hold,
        }
    }

    pub fn buy(ticker: &str, shares: u64) -> Self {
        TradeAction::Order {
            side: Side::Buy,
            ticker: ticker.to_string(),
            shares,
        }
    }

    pub fn sell(ticker: &str, shares: u64) -> Self {
        TradeAction::Order {
            side: Side::Sell,
            ticker: ticker.to_string(),
            shares,
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Hold => write!(f, "HOLD"),
            TradeAction::Order {
                side,
                ticker,
                shares,
            } => write!(f, "{} {} {}", side, ticker, shares),
        }
    }
}

/// Buy/sell annotation kept on an instrument for charting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeMarker {
    pub date: TurnDate,
    pub agent_id: u64,
    pub agent_color: String,
    pub side: Side,
    pub shares: u64,
    pub price: f64,
}

/// What the engine publishes after a fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeReport {
    pub agent_name: String,
    pub side: Side,
    pub ticker: String,
    pub shares: u64,
    pub price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_three_verbs() {
        assert_eq!(TradeAction::parse("HOLD"), TradeAction::Hold);
        assert_eq!(TradeAction::parse("BUY AAPL 100"), TradeAction::buy("AAPL", 100));
        assert_eq!(TradeAction::parse("SELL MSFT 25"), TradeAction::sell("MSFT", 25));
    }

    #[test]
    fn tolerates_case_and_extra_whitespace() {
        assert_eq!(TradeAction::parse("  buy   aapl\t10 "), TradeAction::buy("AAPL", 10));
    }

    #[test]
    fn malformed_actions_degrade_to_hold() {
        for raw in [
            "",
            "SHORT AAPL 10",
            "BUY AAPL",
            "BUY AAPL ten",
            "BUY AAPL 0",
            "BUY AAPL -5",
            "BUY AAPL 10.5",
            "SELL AAPL 10 now",
        ] {
            assert_eq!(TradeAction::parse(raw), TradeAction::Hold, "input {:?}", raw);
        }
    }

    #[test]
    fn display_round_trips_through_parse() {
        let action = TradeAction::sell("BTC", 3);
        assert_eq!(action.to_string(), "SELL BTC 3");
        assert_eq!(TradeAction::parse(&action.to_string()), action);
    }
}
