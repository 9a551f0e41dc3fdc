//! Scored Token
//!
//! Output unit of the scorer: a merged snapshot plus its momentum metrics.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::snapshot::MarketSnapshot;

/// Direction of the current short-horizon move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Pumping,
    Dumping,
    Neutral,
}

impl Category {
    /// Classify a percentage change
    pub fn from_change(change_pct: f64) -> Self {
        if change_pct > 0.0 {
            Category::Pumping
        } else if change_pct < 0.0 {
            Category::Dumping
        } else {
            Category::Neutral
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Pumping => write!(f, "pumping"),
            Category::Dumping => write!(f, "dumping"),
            Category::Neutral => write!(f, "neutral"),
        }
    }
}

/// A snapshot that survived scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredToken {
    #[serde(flatten)]
    pub snapshot: MarketSnapshot,
    pub category: Category,
    /// Progress of the current move toward its predicted amplitude, 0..=100
    pub completion_pct: f64,
    /// Always > 0 for anything that reaches this type
    pub predicted_amplitude: f64,
    pub momentum_score: f64,
    /// Top decile of the population by momentum
    pub highlighted: bool,
}

impl ScoredToken {
    pub fn symbol(&self) -> &str {
        &self.snapshot.symbol
    }

    pub fn display_name(&self) -> &str {
        &self.snapshot.display_name
    }

    /// Case-insensitive substring match on name or symbol.
    /// `needle` must already be lower-cased.
    pub fn matches(&self, needle: &str) -> bool {
        self.snapshot.display_name.to_lowercase().contains(needle)
            || self.snapshot.symbol.to_lowercase().contains(needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_change() {
        assert_eq!(Category::from_change(0.5), Category::Pumping);
        assert_eq!(Category::from_change(-0.01), Category::Dumping);
        assert_eq!(Category::from_change(0.0), Category::Neutral);
    }

    #[test]
    fn test_category_display() {
        assert_eq!(Category::Pumping.to_string(), "pumping");
        assert_eq!(Category::Dumping.to_string(), "dumping");
    }
}
