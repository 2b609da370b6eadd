//! Pure wine balance logic for Vintner.
//!
//! This crate contains the balance scoring engine, independent of any
//! database, UI, or game clock. Functions take plain data and return fresh
//! results, making them unit-testable and safe to call from anywhere
//! (batch creation, pricing, tooltips) without coordination.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`characteristics`] | The six characteristics and the fixed-key table type |
//! | [`conditions`] | Injected rule predicates and their serializable form |
//! | [`config`] | Config bundle, JSON loading and validation |
//! | [`defaults`] | Authored baseline ranges, shifts, penalties and synergies |
//! | [`quality`] | Score tiers and range status for display |
//! | [`range_adjust`] | Cross-characteristic shifts of target ranges |
//! | [`ranges`] | Target ranges and range tables |
//! | [`rules`] | Penalty/synergy evaluation with strongest-wins combination |
//! | [`scoring`] | Distance-from-ideal scoring and diagnostic breakdown |
//!
//! # Usage
//!
//! ```
//! use vintner_logic::characteristics::{Characteristic, CharacteristicVector};
//! use vintner_logic::config::BalanceConfig;
//!
//! let config = BalanceConfig::default();
//! let wine = CharacteristicVector::from_fn(|c| config.baseline[c].midpoint());
//! assert_eq!(config.score(&wine).score, 1.0);
//!
//! let sharp = wine.with(Characteristic::Acidity, 0.95);
//! assert!(config.score(&sharp).score < 1.0);
//! ```

pub mod characteristics;
pub mod conditions;
pub mod config;
pub mod defaults;
pub mod quality;
pub mod range_adjust;
pub mod ranges;
pub mod rules;
pub mod scoring;

pub use characteristics::{Characteristic, CharacteristicVector, PerCharacteristic};
pub use config::{BalanceConfig, ConfigError};
pub use scoring::{breakdown, score, BalanceBreakdown, BalanceResult};
