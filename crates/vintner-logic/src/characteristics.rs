//! The six wine characteristics and the fixed-key table indexed by them.
//!
//! Every table in the engine (values, ranges, multipliers) has exactly one
//! entry per characteristic, so it is a plain six-field struct rather than a
//! map. Missing keys are a deserialization error, never a runtime lookup miss.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named dimension of a wine's flavor profile, normalized to `[0, 1]`.
///
/// Declaration order is the natural key order used wherever the engine
/// iterates characteristics (notably the chained range shifts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Characteristic {
    Acidity,
    Aroma,
    Body,
    Spice,
    Sweetness,
    Tannins,
}

impl Characteristic {
    /// All characteristics in natural key order.
    pub const ALL: [Characteristic; 6] = [
        Self::Acidity,
        Self::Aroma,
        Self::Body,
        Self::Spice,
        Self::Sweetness,
        Self::Tannins,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Acidity => "acidity",
            Self::Aroma => "aroma",
            Self::Body => "body",
            Self::Spice => "spice",
            Self::Sweetness => "sweetness",
            Self::Tannins => "tannins",
        }
    }
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Characteristic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown characteristic '{}'", s))
    }
}

/// One value of `T` for each characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerCharacteristic<T> {
    pub acidity: T,
    pub aroma: T,
    pub body: T,
    pub spice: T,
    pub sweetness: T,
    pub tannins: T,
}

/// Current state of a wine batch: one value per characteristic.
pub type CharacteristicVector = PerCharacteristic<f64>;

impl<T> PerCharacteristic<T> {
    /// Build a table by calling `f` once per characteristic, in key order.
    pub fn from_fn(mut f: impl FnMut(Characteristic) -> T) -> Self {
        Self {
            acidity: f(Characteristic::Acidity),
            aroma: f(Characteristic::Aroma),
            body: f(Characteristic::Body),
            spice: f(Characteristic::Spice),
            sweetness: f(Characteristic::Sweetness),
            tannins: f(Characteristic::Tannins),
        }
    }

    /// Iterate `(characteristic, &value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (Characteristic, &T)> + '_ {
        Characteristic::ALL.into_iter().map(move |c| (c, &self[c]))
    }

    pub fn map<U>(&self, mut f: impl FnMut(Characteristic, &T) -> U) -> PerCharacteristic<U> {
        PerCharacteristic::from_fn(|c| f(c, &self[c]))
    }
}

impl<T: Clone> PerCharacteristic<T> {
    /// Table with the same value in every slot.
    pub fn splat(value: T) -> Self {
        Self::from_fn(|_| value.clone())
    }
}

impl CharacteristicVector {
    /// Copy of this vector with one characteristic replaced.
    pub fn with(mut self, characteristic: Characteristic, value: f64) -> Self {
        self[characteristic] = value;
        self
    }
}

impl<T> Index<Characteristic> for PerCharacteristic<T> {
    type Output = T;

    fn index(&self, c: Characteristic) -> &T {
        match c {
            Characteristic::Acidity => &self.acidity,
            Characteristic::Aroma => &self.aroma,
            Characteristic::Body => &self.body,
            Characteristic::Spice => &self.spice,
            Characteristic::Sweetness => &self.sweetness,
            Characteristic::Tannins => &self.tannins,
        }
    }
}

impl<T> IndexMut<Characteristic> for PerCharacteristic<T> {
    fn index_mut(&mut self, c: Characteristic) -> &mut T {
        match c {
            Characteristic::Acidity => &mut self.acidity,
            Characteristic::Aroma => &mut self.aroma,
            Characteristic::Body => &mut self.body,
            Characteristic::Spice => &mut self.spice,
            Characteristic::Sweetness => &mut self.sweetness,
            Characteristic::Tannins => &mut self.tannins,
        }
    }
}
