//! Display helpers: score tiers and per-characteristic range status.

use serde::{Deserialize, Serialize};

use crate::ranges::Range;

/// Coarse label for a balance score, used by the UI and the harness report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BalanceTier {
    Unbalanced,
    Rough,
    Decent,
    Harmonious,
    Exquisite,
}

impl BalanceTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            Self::Exquisite
        } else if score >= 0.7 {
            Self::Harmonious
        } else if score >= 0.5 {
            Self::Decent
        } else if score >= 0.3 {
            Self::Rough
        } else {
            Self::Unbalanced
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Unbalanced => "Unbalanced",
            Self::Rough => "Rough",
            Self::Decent => "Decent",
            Self::Harmonious => "Harmonious",
            Self::Exquisite => "Exquisite",
        }
    }
}

/// Where a value sits relative to its adjusted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacteristicStatus {
    Below,
    Within,
    Above,
}

impl CharacteristicStatus {
    pub fn classify(value: f64, range: &Range) -> Self {
        if value < range.min {
            Self::Below
        } else if value > range.max {
            Self::Above
        } else {
            Self::Within
        }
    }
}
