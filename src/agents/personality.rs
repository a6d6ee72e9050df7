// src/agents/personality.rs

use super::config::{
    AGGRESSIVE_BUY_CHANCE, AGGRESSIVE_SELL_CHANCE, CONSERVATIVE_BUY_CHANCE,
    CONSERVATIVE_SELL_CHANCE, DEFAULT_BUY_CHANCE, DEFAULT_SELL_CHANCE,
};

const CONSERVATIVE_WORDS: &[&str] = &["conservative", "cautious", "value", "dividend", "patient", "defensive"];
const AGGRESSIVE_WORDS: &[&str] = &["aggressive", "bold", "momentum", "high-risk", "yolo", "speculative"];
const TECHNICAL_WORDS: &[&str] = &["technical", "chart", "quant", "pattern", "trend", "indicator"];

/// Trading traits read out of a free-text personality description.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Personality {
    pub conservative: bool,
    pub aggressive: bool,
    pub technical: bool,
}

impl Personality {
    /// Keyword match, case-insensitive. Several traits may be set at once.
    pub fn classify(description: &str) -> Self {
        let text = description.to_lowercase();
        let has_any = |words: &[&str]| words.iter().any(|w| text.contains(w));
        Self {
            conservative: has_any(CONSERVATIVE_WORDS),
            aggressive: has_any(AGGRESSIVE_WORDS),
            technical: has_any(TECHNICAL_WORDS),
        }
    }

    pub fn is_balanced(&self) -> bool {
        !self.conservative && !self.aggressive && !self.technical
    }

    /// Aggressive wins over conservative when both are present.
    pub fn buy_chance(&self) -> f64 {
        if self.aggressive {
            AGGRESSIVE_BUY_CHANCE
        } else if self.conservative {
            CONSERVATIVE_BUY_CHANCE
        } else {
            DEFAULT_BUY_CHANCE
        }
    }

    pub fn sell_chance(&self) -> f64 {
        if self.aggressive {
            AGGRESSIVE_SELL_CHANCE
        } else if self.conservative {
            CONSERVATIVE_SELL_CHANCE
        } else {
            DEFAULT_SELL_CHANCE
        }
    }

    pub fn label(&self) -> &'static str {
        if self.aggressive {
            "aggressive"
        } else if self.conservative {
            "conservative"
        } else if self.technical {
            "technical"
        } else {
            "balanced"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_keywords() {
        let p = Personality::classify("A cautious VALUE investor who loves dividends");
        assert!(p.conservative && !p.aggressive && !p.technical);

        let p = Personality::classify("Bold momentum chaser");
        assert!(p.aggressive && !p.conservative);

        let p = Personality::classify("Reads charts and technical indicators");
        assert!(p.technical);
        assert_eq!(p.label(), "technical");

        assert!(Personality::classify("Just vibes").is_balanced());
    }

    #[test]
    fn odds_follow_the_dominant_trait() {
        let aggressive = Personality { aggressive: true, conservative: true, technical: false };
        assert_eq!(aggressive.buy_chance(), 0.5);
        assert_eq!(aggressive.sell_chance(), 0.3);

        let conservative = Personality { conservative: true, ..Default::default() };
        assert_eq!(conservative.buy_chance(), 0.25);
        assert_eq!(conservative.sell_chance(), 0.15);

        let technical = Personality { technical: true, ..Default::default() };
        assert_eq!(technical.buy_chance(), 0.35);
        assert_eq!(technical.sell_chance(), 0.2);
    }
}
