//! Target ranges: the ideal interval for each characteristic.

use serde::{Deserialize, Serialize};

use crate::characteristics::PerCharacteristic;

/// Floor applied to every width/half-width before it is used as a divisor.
pub const MIN_EPSILON: f64 = 1e-6;

/// Narrowest adjusted range the engine will produce.
pub const MIN_RANGE_WIDTH: f64 = 0.02;

/// A closed interval `[min, max]` on the unit scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

/// The configured ideal range per characteristic, before adjustment.
pub type BaselineRangeTable = PerCharacteristic<Range>;

/// Baseline ranges after cross-characteristic shifts for one vector.
pub type AdjustedRangeTable = PerCharacteristic<Range>;

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Width floored at [`MIN_EPSILON`], safe to divide by.
    pub fn safe_width(&self) -> f64 {
        self.width().max(MIN_EPSILON)
    }

    /// Half the width, floored at [`MIN_EPSILON`].
    pub fn safe_half_width(&self) -> f64 {
        (self.width() / 2.0).max(MIN_EPSILON)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// How far `value` lies outside the range; 0 when inside.
    pub fn distance_outside(&self, value: f64) -> f64 {
        0.0_f64.max(self.min - value).max(value - self.max)
    }

    /// True when `0 <= min <= max <= 1` and both bounds are finite.
    pub fn is_valid_unit(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min >= 0.0
            && self.min <= self.max
            && self.max <= 1.0
    }

    pub(crate) fn shifted(&self, delta: f64) -> Self {
        Self::new(self.min + delta, self.max + delta)
    }

    /// Clamp both bounds into `bounds`. Never panics, even on inverted bounds.
    pub(crate) fn clamped_to(&self, bounds: &Range) -> Self {
        Self::new(
            self.min.max(bounds.min).min(bounds.max),
            self.max.max(bounds.min).min(bounds.max),
        )
    }

    pub(crate) fn clamped_unit(&self) -> Self {
        self.clamped_to(&Range::new(0.0, 1.0))
    }

    /// Widen a degenerate range to [`MIN_RANGE_WIDTH`] around its center.
    /// A window that would cross 0 or 1 is pinned to that edge. The result is
    /// never narrower than [`MIN_RANGE_WIDTH`], even after rounding.
    pub(crate) fn with_min_width(&self) -> Self {
        if self.width() >= MIN_RANGE_WIDTH {
            return *self;
        }
        let half = MIN_RANGE_WIDTH / 2.0;
        let center = self.midpoint();
        let (mut min, mut max) = if center - half <= 0.0 {
            (0.0, MIN_RANGE_WIDTH)
        } else if center + half >= 1.0 {
            (1.0 - MIN_RANGE_WIDTH, 1.0)
        } else {
            let min = center - half;
            (min, (min + MIN_RANGE_WIDTH).min(1.0))
        };
        // Rounding can leave the window a few ulps short.
        while max - min < MIN_RANGE_WIDTH {
            if max < 1.0 {
                max = next_up(max);
            } else {
                min = next_down(min);
            }
        }
        Self::new(min, max)
    }
}

/// Next representable value above a non-negative finite `x`.
fn next_up(x: f64) -> f64 {
    f64::from_bits(x.to_bits() + 1)
}

/// Next representable value below a positive finite `x`.
fn next_down(x: f64) -> f64 {
    f64::from_bits(x.to_bits() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midpoint_and_width() {
        let r = Range::new(0.4, 0.8);
        assert!((r.midpoint() - 0.6).abs() < 1e-12);
        assert!((r.width() - 0.4).abs() < 1e-12);
        assert!((r.safe_half_width() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_zero_width_is_floored() {
        let r = Range::new(0.5, 0.5);
        assert_eq!(r.safe_width(), MIN_EPSILON);
        assert_eq!(r.safe_half_width(), MIN_EPSILON);
    }

    #[test]
    fn test_distance_outside() {
        let r = Range::new(0.4, 0.6);
        assert_eq!(r.distance_outside(0.5), 0.0);
        assert_eq!(r.distance_outside(0.4), 0.0);
        assert!((r.distance_outside(0.9) - 0.3).abs() < 1e-12);
        assert!((r.distance_outside(0.1) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_min_width_recenters() {
        let r = Range::new(0.5, 0.5).with_min_width();
        assert!((r.width() - MIN_RANGE_WIDTH).abs() < 1e-12);
        assert!((r.midpoint() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_min_width_pins_to_edges() {
        let low = Range::new(0.0, 0.0).with_min_width();
        assert_eq!(low, Range::new(0.0, MIN_RANGE_WIDTH));
        let high = Range::new(1.0, 1.0).with_min_width();
        assert_eq!(high.max, 1.0);
        assert!((high.width() - MIN_RANGE_WIDTH).abs() < 1e-12);
    }

    #[test]
    fn test_min_width_never_short() {
        for i in 0..=1000 {
            let x = i as f64 / 1000.0;
            let r = Range::new(x, x).with_min_width();
            assert!(r.width() >= MIN_RANGE_WIDTH, "x={x} width={}", r.width());
            assert!(r.is_valid_unit(), "x={x} {r:?}");
        }
    }

    #[test]
    fn test_wide_range_untouched() {
        let r = Range::new(0.2, 0.3);
        assert_eq!(r.with_min_width(), r);
    }

    #[test]
    fn test_validity() {
        assert!(Range::new(0.0, 1.0).is_valid_unit());
        assert!(Range::new(0.5, 0.5).is_valid_unit());
        assert!(!Range::new(0.6, 0.4).is_valid_unit());
        assert!(!Range::new(-0.1, 0.4).is_valid_unit());
        assert!(!Range::new(0.1, f64::NAN).is_valid_unit());
    }
}
