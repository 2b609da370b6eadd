//! Dynamic range adjustment: cross-characteristic shifts of target ranges.
//!
//! When a characteristic sits above or below its baseline midpoint, the ideal
//! range of other characteristics moves with it (a very acidic wine tolerates
//! less sweetness, a full-bodied one carries more tannin, and so on).
//!
//! Shifts are applied to a single working table while iterating sources in
//! natural key order, so a target shifted by several sources accumulates all
//! of them, each scaled by the target width *at that point*. The result is
//! order-dependent when more than one source moves the same target.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::characteristics::{Characteristic, CharacteristicVector};
use crate::ranges::{AdjustedRangeTable, BaselineRangeTable, Range, MIN_EPSILON};

/// Deviations smaller than this count as "at baseline" and shift nothing.
pub const DEVIATION_DEAD_ZONE: f64 = 1e-6;

/// Which side of the source's baseline midpoint the value falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
}

/// One shift: move `target`'s range by `shift_per_unit * deviation * width`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeShiftRule {
    pub target: Characteristic,
    pub shift_per_unit: f64,
    /// Bounds applied after shifting, before the unit clamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clamp: Option<Range>,
}

impl RangeShiftRule {
    pub fn new(target: Characteristic, shift_per_unit: f64) -> Self {
        Self {
            target,
            shift_per_unit,
            clamp: None,
        }
    }

    pub fn clamped(mut self, min: f64, max: f64) -> Self {
        self.clamp = Some(Range::new(min, max));
        self
    }
}

/// Shift rules for one source characteristic, split by direction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionalShifts {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub above: Vec<RangeShiftRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub below: Vec<RangeShiftRule>,
}

impl DirectionalShifts {
    pub fn for_direction(&self, direction: Direction) -> &[RangeShiftRule] {
        match direction {
            Direction::Above => &self.above,
            Direction::Below => &self.below,
        }
    }
}

/// All configured shift rules, keyed by source characteristic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeAdjustmentConfig {
    pub sources: BTreeMap<Characteristic, DirectionalShifts>,
}

impl RangeAdjustmentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a shift rule for `(source, direction)`.
    pub fn with_rule(
        mut self,
        source: Characteristic,
        direction: Direction,
        rule: RangeShiftRule,
    ) -> Self {
        let entry = self.sources.entry(source).or_default();
        match direction {
            Direction::Above => entry.above.push(rule),
            Direction::Below => entry.below.push(rule),
        }
        self
    }

    /// Rules configured for `(source, direction)`, possibly empty.
    pub fn rules_for(&self, source: Characteristic, direction: Direction) -> &[RangeShiftRule] {
        self.sources
            .get(&source)
            .map(|d| d.for_direction(direction))
            .unwrap_or(&[])
    }

    /// Total number of shift rules across all sources and directions.
    pub fn rule_count(&self) -> usize {
        self.sources
            .values()
            .map(|d| d.above.len() + d.below.len())
            .sum()
    }
}

/// Signed deviation of `value` from the baseline midpoint, as a fraction of
/// the full baseline width. Roughly `[-0.5, 0.5]` for in-range values.
pub fn deviation_pct(value: f64, baseline: &Range) -> f64 {
    (value - baseline.midpoint()) / baseline.safe_width()
}

/// Apply one shift rule to the current range of its target.
fn apply_shift(current: &Range, rule: &RangeShiftRule, deviation: f64) -> Range {
    let target_width = current.width().max(MIN_EPSILON);
    let delta = rule.shift_per_unit * deviation * target_width;

    let mut next = current.shifted(delta);
    if let Some(bounds) = &rule.clamp {
        next = next.clamped_to(bounds);
    }
    next.clamped_unit().with_min_width()
}

/// Compute the adjusted target ranges for `vector`.
///
/// Total: never fails, never mutates its inputs. Values outside `[0, 1]`
/// are tolerated and simply produce larger deviations.
pub fn adjust_ranges(
    vector: &CharacteristicVector,
    baseline: &BaselineRangeTable,
    config: &RangeAdjustmentConfig,
) -> AdjustedRangeTable {
    let mut adjusted = *baseline;

    for source in Characteristic::ALL {
        let deviation = deviation_pct(vector[source], &baseline[source]);
        if deviation.abs() < DEVIATION_DEAD_ZONE {
            continue;
        }
        let direction = if deviation > 0.0 {
            Direction::Above
        } else {
            Direction::Below
        };

        for rule in config.rules_for(source, direction) {
            let before = adjusted[rule.target];
            let after = apply_shift(&before, rule, deviation);
            log::trace!(
                "range shift {}:{:?} -> {} [{:.4}, {:.4}] => [{:.4}, {:.4}]",
                source,
                direction,
                rule.target,
                before.min,
                before.max,
                after.min,
                after.max
            );
            adjusted[rule.target] = after;
        }
    }

    adjusted
}
