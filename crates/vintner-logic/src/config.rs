//! Balance configuration: the three static tables the engine reads.
//!
//! A [`BalanceConfig`] is either built in Rust (see [`crate::defaults`]) or
//! loaded from JSON with [`BalanceConfig::from_json`]. JSON rules describe
//! their condition as a [`ConditionExpr`], which is compiled into a closure
//! on load. Loading validates the tables; scoring never does.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::characteristics::{Characteristic, CharacteristicVector};
use crate::conditions::ConditionExpr;
use crate::range_adjust::{Direction, RangeAdjustmentConfig};
use crate::ranges::BaselineRangeTable;
use crate::rules::{evaluate_rules, EvaluationOptions, Rule, RuleConfig, RuleEvaluation, RuleKind};
use crate::scoring::{self, BalanceBreakdown, BalanceResult};

/// Errors raised when balance configuration invariants are violated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse balance config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("baseline range for {characteristic} must satisfy 0 <= min <= max <= 1 (got [{min:.3}, {max:.3}])")]
    InvalidBaseline {
        characteristic: Characteristic,
        min: f64,
        max: f64,
    },
    #[error("clamp for {origin}:{direction:?} -> {target} is invalid (got [{min:.3}, {max:.3}])")]
    InvalidClamp {
        origin: Characteristic,
        direction: Direction,
        target: Characteristic,
        min: f64,
        max: f64,
    },
    #[error("shift_per_unit for {origin}:{direction:?} -> {target} must be finite")]
    NonFiniteShift {
        origin: Characteristic,
        direction: Direction,
        target: Characteristic,
    },
    #[error("{origin}:{direction:?} shifts {target} more than once")]
    DuplicateShiftTarget {
        origin: Characteristic,
        direction: Direction,
        target: Characteristic,
    },
    #[error("{kind:?} rule has an empty name")]
    UnnamedRule { kind: RuleKind },
    #[error("{kind:?} rule '{rule}' has no source characteristics")]
    NoSources { kind: RuleKind, rule: String },
    #[error("{kind:?} rule '{rule}' has no target characteristics")]
    NoTargets { kind: RuleKind, rule: String },
    #[error("{kind:?} rule '{rule}': {field} must be at least {min:.2} (got {value:.3})")]
    ParameterTooSmall {
        kind: RuleKind,
        rule: String,
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("synergy rule '{rule}': cap must be between 0 and 1 (got {value:.3})")]
    SynergyCapOutOfRange { rule: String, value: f64 },
}

/// Serializable form of a [`Rule`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDef {
    pub name: String,
    pub sources: Vec<Characteristic>,
    pub targets: Vec<Characteristic>,
    pub when: ConditionExpr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap: Option<f64>,
}

impl From<RuleDef> for Rule {
    fn from(def: RuleDef) -> Self {
        Rule {
            name: def.name,
            sources: def.sources,
            targets: def.targets,
            condition: def.when.into(),
            k: def.k,
            p: def.p,
            cap: def.cap,
        }
    }
}

/// On-disk layout of a balance config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceConfigFile {
    pub baseline: BaselineRangeTable,
    #[serde(default)]
    pub range_shifts: RangeAdjustmentConfig,
    #[serde(default)]
    pub penalties: Vec<RuleDef>,
    #[serde(default)]
    pub synergies: Vec<RuleDef>,
}

/// Everything the engine needs besides the vector itself.
#[derive(Debug, Clone)]
pub struct BalanceConfig {
    pub baseline: BaselineRangeTable,
    pub range_shifts: RangeAdjustmentConfig,
    pub rules: RuleConfig,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            baseline: crate::defaults::baseline_ranges(),
            range_shifts: crate::defaults::range_shifts(),
            rules: crate::defaults::rules(),
        }
    }
}

impl TryFrom<BalanceConfigFile> for BalanceConfig {
    type Error = ConfigError;

    fn try_from(file: BalanceConfigFile) -> Result<Self, Self::Error> {
        let config = Self {
            baseline: file.baseline,
            range_shifts: file.range_shifts,
            rules: RuleConfig {
                penalties: file.penalties.into_iter().map(Rule::from).collect(),
                synergies: file.synergies.into_iter().map(Rule::from).collect(),
            },
        };
        config.validate()?;
        Ok(config)
    }
}

impl BalanceConfig {
    /// Parse, validate and compile a JSON balance config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let file: BalanceConfigFile = serde_json::from_str(json)?;
        let config = Self::try_from(file)?;
        log::debug!(
            "loaded balance config: {} shift rules, {} penalties, {} synergies",
            config.range_shifts.rule_count(),
            config.rules.penalties.len(),
            config.rules.synergies.len()
        );
        Ok(config)
    }

    /// Check every table invariant. Returns the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_baseline()?;
        self.validate_shifts()?;
        for (kind, rule) in self.rules.iter() {
            validate_rule(kind, rule)?;
        }
        Ok(())
    }

    fn validate_baseline(&self) -> Result<(), ConfigError> {
        for (characteristic, range) in self.baseline.iter() {
            if !range.is_valid_unit() {
                return Err(ConfigError::InvalidBaseline {
                    characteristic,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        Ok(())
    }

    fn validate_shifts(&self) -> Result<(), ConfigError> {
        for (&origin, shifts) in &self.range_shifts.sources {
            for direction in [Direction::Above, Direction::Below] {
                let mut seen = HashSet::new();
                for rule in shifts.for_direction(direction) {
                    if !seen.insert(rule.target) {
                        return Err(ConfigError::DuplicateShiftTarget {
                            origin,
                            direction,
                            target: rule.target,
                        });
                    }
                    if !rule.shift_per_unit.is_finite() {
                        return Err(ConfigError::NonFiniteShift {
                            origin,
                            direction,
                            target: rule.target,
                        });
                    }
                    if let Some(clamp) = &rule.clamp {
                        if !clamp.is_valid_unit() {
                            return Err(ConfigError::InvalidClamp {
                                origin,
                                direction,
                                target: rule.target,
                                min: clamp.min,
                                max: clamp.max,
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Score `vector` against this config.
    pub fn score(&self, vector: &CharacteristicVector) -> BalanceResult {
        scoring::score(vector, &self.baseline, &self.range_shifts, &self.rules)
    }

    /// Full diagnostic breakdown of `vector` against this config.
    pub fn breakdown(&self, vector: &CharacteristicVector) -> BalanceBreakdown {
        scoring::breakdown(vector, &self.baseline, &self.range_shifts, &self.rules)
    }

    /// Evaluate only the rules, with the requested diagnostics.
    pub fn evaluate(
        &self,
        vector: &CharacteristicVector,
        options: EvaluationOptions,
    ) -> RuleEvaluation {
        evaluate_rules(vector, &self.baseline, &self.rules, options)
    }
}

fn validate_rule(kind: RuleKind, rule: &Rule) -> Result<(), ConfigError> {
    if rule.name.trim().is_empty() {
        return Err(ConfigError::UnnamedRule { kind });
    }
    if rule.sources.is_empty() {
        return Err(ConfigError::NoSources {
            kind,
            rule: rule.name.clone(),
        });
    }
    if rule.targets.is_empty() {
        return Err(ConfigError::NoTargets {
            kind,
            rule: rule.name.clone(),
        });
    }

    let too_small = |field: &'static str, min: f64, value: f64| ConfigError::ParameterTooSmall {
        kind,
        rule: rule.name.clone(),
        field,
        min,
        value,
    };
    // `!(x >= min)` also rejects NaN.
    let k = rule.effective_k();
    if !(k >= 0.0) {
        return Err(too_small("k", 0.0, k));
    }
    let p = rule.effective_p();
    if !(p > 0.0) {
        return Err(too_small("p", f64::EPSILON, p));
    }
    let cap = rule.effective_cap(kind);
    match kind {
        RuleKind::Penalty if !(cap >= 0.0) => Err(too_small("cap", 0.0, cap)),
        RuleKind::Synergy if !(0.0..=1.0).contains(&cap) => Err(ConfigError::SynergyCapOutOfRange {
            rule: rule.name.clone(),
            value: cap,
        }),
        _ => Ok(()),
    }
}
