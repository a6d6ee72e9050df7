// src/types/calendar.rs

use serde::{Deserialize, Serialize};
use std::fmt;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A simulated calendar month. One turn of the arena advances it by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TurnDate {
    pub year: i32,
    /// 1-based month, always in `1..=12`.
    pub month: u32,
}

impl TurnDate {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn is_valid(&self) -> bool {
        (1..=12).contains(&self.month)
    }

    /// The following month, rolling the year over after December.
    pub fn next(self) -> Self {
        if self.month >= 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    /// Whole months from `self` to `later`. Negative when `later` is earlier.
    pub fn months_until(&self, later: &TurnDate) -> i64 {
        (later.year as i64 - self.year as i64) * 12 + (later.month as i64 - self.month as i64)
    }
}

impl fmt::Display for TurnDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = MONTH_NAMES
            .get(self.month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or("???");
        write!(f, "{} {}", name, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_rolls_the_year_over_after_december() {
        assert_eq!(TurnDate::new(2020, 11).next(), TurnDate::new(2020, 12));
        assert_eq!(TurnDate::new(2020, 12).next(), TurnDate::new(2021, 1));
    }

    #[test]
    fn months_until_spans_years() {
        let start = TurnDate::new(2000, 1);
        assert_eq!(start.months_until(&TurnDate::new(2000, 3)), 2);
        assert_eq!(start.months_until(&TurnDate::new(2024, 12)), 24 * 12 + 11);
        assert_eq!(TurnDate::new(2001, 2).months_until(&start), -13);
    }

    #[test]
    fn ordering_follows_the_calendar() {
        assert!(TurnDate::new(2020, 12) < TurnDate::new(2021, 1));
        assert!(TurnDate::new(2020, 4) > TurnDate::new(2020, 3));
    }

    #[test]
    fn display_uses_short_month_names() {
        assert_eq!(TurnDate::new(2008, 9).to_string(), "Sep 2008");
        assert!(!TurnDate::new(2008, 13).is_valid());
    }
}
