//! Balance scoring: the top of the pipeline.
//!
//! Ranges are adjusted for the vector, rules are evaluated, and each
//! characteristic's distance from its adjusted ideal is weighted:
//!
//! ```text
//! distance = (|value - mid| + 2 * outside) * penalty_scaling * (1 - synergy)
//! score    = max(0, 1 - 2 * mean(distance))
//! ```
//!
//! [`score`] and [`breakdown`] share one routine, so the breakdown always
//! reproduces the score bit-for-bit.

use serde::{Deserialize, Serialize};

use crate::characteristics::{Characteristic, CharacteristicVector, PerCharacteristic};
use crate::quality::{BalanceTier, CharacteristicStatus};
use crate::range_adjust::{adjust_ranges, RangeAdjustmentConfig};
use crate::ranges::{AdjustedRangeTable, BaselineRangeTable, Range};
use crate::rules::{evaluate_rules, EvaluationOptions, RuleConfig, RuleEvaluation};

/// Weight on the part of the distance that falls outside the adjusted range.
pub const OUTSIDE_PENALTY_FACTOR: f64 = 2.0;

/// Maps mean distance to score: `1 - mean * SCORE_SLOPE`.
pub const SCORE_SLOPE: f64 = 2.0;

/// Final score plus the ranges it was measured against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceResult {
    pub score: f64,
    pub adjusted_ranges: AdjustedRangeTable,
}

impl BalanceResult {
    pub fn tier(&self) -> BalanceTier {
        BalanceTier::from_score(self.score)
    }
}

/// Every intermediate term for one characteristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacteristicBreakdown {
    pub characteristic: Characteristic,
    pub value: f64,
    pub adjusted_range: Range,
    pub midpoint: f64,
    pub distance_inside: f64,
    pub distance_outside: f64,
    /// `OUTSIDE_PENALTY_FACTOR * distance_outside`.
    pub penalty: f64,
    /// `distance_inside + penalty`, before rule effects.
    pub base_distance: f64,
    pub penalty_scaling: f64,
    pub synergy_reduction: f64,
    pub total_distance: f64,
    pub status: CharacteristicStatus,
}

/// Full diagnostic view of one scoring call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceBreakdown {
    pub score: f64,
    pub average_distance: f64,
    pub adjusted_ranges: AdjustedRangeTable,
    pub characteristics: PerCharacteristic<CharacteristicBreakdown>,
    pub rules: RuleEvaluation,
}

impl BalanceBreakdown {
    pub fn tier(&self) -> BalanceTier {
        BalanceTier::from_score(self.score)
    }

    pub fn result(&self) -> BalanceResult {
        BalanceResult {
            score: self.score,
            adjusted_ranges: self.adjusted_ranges,
        }
    }
}

fn characteristic_terms(
    characteristic: Characteristic,
    value: f64,
    range: Range,
    penalty_scaling: f64,
    synergy_reduction: f64,
) -> CharacteristicBreakdown {
    let midpoint = range.midpoint();
    let distance_inside = (value - midpoint).abs();
    let distance_outside = range.distance_outside(value);
    let penalty = OUTSIDE_PENALTY_FACTOR * distance_outside;
    let base_distance = distance_inside + penalty;

    let mut total_distance = base_distance;
    total_distance *= penalty_scaling;
    total_distance *= 1.0 - synergy_reduction;

    CharacteristicBreakdown {
        characteristic,
        value,
        adjusted_range: range,
        midpoint,
        distance_inside,
        distance_outside,
        penalty,
        base_distance,
        penalty_scaling,
        synergy_reduction,
        total_distance,
        status: CharacteristicStatus::classify(value, &range),
    }
}

fn run(
    vector: &CharacteristicVector,
    baseline: &BaselineRangeTable,
    shifts: &RangeAdjustmentConfig,
    rules: &RuleConfig,
    options: EvaluationOptions,
) -> BalanceBreakdown {
    let adjusted_ranges = adjust_ranges(vector, baseline, shifts);
    let evaluation = evaluate_rules(vector, baseline, rules, options);

    let characteristics = PerCharacteristic::from_fn(|c| {
        characteristic_terms(
            c,
            vector[c],
            adjusted_ranges[c],
            evaluation.penalty_scaling[c],
            evaluation.synergy_reductions[c],
        )
    });

    let total: f64 = characteristics.iter().map(|(_, b)| b.total_distance).sum();
    let average_distance = total / Characteristic::ALL.len() as f64;
    let score = (1.0 - average_distance * SCORE_SLOPE).max(0.0);

    BalanceBreakdown {
        score,
        average_distance,
        adjusted_ranges,
        characteristics,
        rules: evaluation,
    }
}

/// Score a wine's balance in `[0, 1]`.
pub fn score(
    vector: &CharacteristicVector,
    baseline: &BaselineRangeTable,
    shifts: &RangeAdjustmentConfig,
    rules: &RuleConfig,
) -> BalanceResult {
    run(vector, baseline, shifts, rules, EvaluationOptions::PLAIN).result()
}

/// Same computation as [`score`], keeping every intermediate term and the
/// dry-run/detailed rule diagnostics for display.
pub fn breakdown(
    vector: &CharacteristicVector,
    baseline: &BaselineRangeTable,
    shifts: &RangeAdjustmentConfig,
    rules: &RuleConfig,
) -> BalanceBreakdown {
    run(vector, baseline, shifts, rules, EvaluationOptions::FULL)
}
