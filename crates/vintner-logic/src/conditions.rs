//! Rule conditions: injected predicates over a characteristic vector.
//!
//! A [`Condition`] is an opaque closure, so designers can express any rule
//! without touching the scorer. [`ConditionExpr`] is the serializable form
//! used by JSON configs; it compiles into a `Condition`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::characteristics::{Characteristic, CharacteristicVector};

type Predicate = dyn Fn(&CharacteristicVector) -> bool + Send + Sync;

/// A shareable boolean predicate over the full characteristic vector.
#[derive(Clone)]
pub struct Condition(Arc<Predicate>);

impl Condition {
    pub fn new(f: impl Fn(&CharacteristicVector) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// A condition that always holds.
    pub fn always() -> Self {
        Self::new(|_| true)
    }

    pub fn holds(&self, vector: &CharacteristicVector) -> bool {
        (self.0)(vector)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Condition(<fn>)")
    }
}

impl From<ConditionExpr> for Condition {
    fn from(expr: ConditionExpr) -> Self {
        Condition::new(move |v| expr.evaluate(v))
    }
}

/// Serializable boolean expression tree.
///
/// `above`/`below` are strict comparisons; `between` is inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ConditionExpr {
    Always,
    Above {
        characteristic: Characteristic,
        threshold: f64,
    },
    Below {
        characteristic: Characteristic,
        threshold: f64,
    },
    Between {
        characteristic: Characteristic,
        min: f64,
        max: f64,
    },
    All {
        conditions: Vec<ConditionExpr>,
    },
    Any {
        conditions: Vec<ConditionExpr>,
    },
    Not {
        condition: Box<ConditionExpr>,
    },
}

impl ConditionExpr {
    pub fn above(characteristic: Characteristic, threshold: f64) -> Self {
        Self::Above {
            characteristic,
            threshold,
        }
    }

    pub fn below(characteristic: Characteristic, threshold: f64) -> Self {
        Self::Below {
            characteristic,
            threshold,
        }
    }

    pub fn between(characteristic: Characteristic, min: f64, max: f64) -> Self {
        Self::Between {
            characteristic,
            min,
            max,
        }
    }

    pub fn all(conditions: Vec<ConditionExpr>) -> Self {
        Self::All { conditions }
    }

    pub fn any(conditions: Vec<ConditionExpr>) -> Self {
        Self::Any { conditions }
    }

    pub fn not(condition: ConditionExpr) -> Self {
        Self::Not {
            condition: Box::new(condition),
        }
    }

    pub fn evaluate(&self, v: &CharacteristicVector) -> bool {
        match self {
            Self::Always => true,
            Self::Above {
                characteristic,
                threshold,
            } => v[*characteristic] > *threshold,
            Self::Below {
                characteristic,
                threshold,
            } => v[*characteristic] < *threshold,
            Self::Between {
                characteristic,
                min,
                max,
            } => {
                let x = v[*characteristic];
                x >= *min && x <= *max
            }
            // Empty `all` holds, empty `any` does not.
            Self::All { conditions } => conditions.iter().all(|c| c.evaluate(v)),
            Self::Any { conditions } => conditions.iter().any(|c| c.evaluate(v)),
            Self::Not { condition } => !condition.evaluate(v),
        }
    }
}
