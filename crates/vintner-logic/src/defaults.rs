//! Authored game tables: baseline ranges, range shifts and rules.
//!
//! These are the values the game ships with. `data/balance_config.json`
//! carries the same tables in file form; the harness checks they agree.

use crate::characteristics::Characteristic::{self, *};
use crate::conditions::Condition;
use crate::range_adjust::{Direction, RangeAdjustmentConfig, RangeShiftRule};
use crate::ranges::{BaselineRangeTable, Range};
use crate::rules::{Rule, RuleConfig};

/// Ideal range per characteristic before any adjustment.
pub fn baseline_ranges() -> BaselineRangeTable {
    BaselineRangeTable {
        acidity: Range::new(0.4, 0.6),
        aroma: Range::new(0.3, 0.7),
        body: Range::new(0.4, 0.8),
        spice: Range::new(0.35, 0.65),
        sweetness: Range::new(0.4, 0.6),
        tannins: Range::new(0.35, 0.65),
    }
}

/// Cross-characteristic shifts.
pub fn range_shifts() -> RangeAdjustmentConfig {
    use Direction::{Above, Below};

    let shift = RangeShiftRule::new;
    let rules: [(Characteristic, Direction, RangeShiftRule); 23] = [
        // Sharp wines want less sugar and softer tannins.
        (Acidity, Above, shift(Sweetness, -0.15).clamped(0.1, 0.9)),
        (Acidity, Above, shift(Tannins, -0.10)),
        (Acidity, Below, shift(Sweetness, 0.10)),
        (Acidity, Below, shift(Body, -0.10)),
        (Aroma, Above, shift(Body, 0.10)),
        (Aroma, Above, shift(Spice, 0.05)),
        (Aroma, Below, shift(Body, -0.10)),
        // Full body carries more tannin, spice and aroma.
        (Body, Above, shift(Tannins, 0.15).clamped(0.2, 0.9)),
        (Body, Above, shift(Spice, 0.10)),
        (Body, Above, shift(Aroma, 0.10)),
        (Body, Below, shift(Tannins, -0.15)),
        (Body, Below, shift(Sweetness, -0.10)),
        (Spice, Above, shift(Aroma, 0.10)),
        (Spice, Above, shift(Body, 0.10)),
        (Spice, Below, shift(Aroma, -0.05)),
        // Sugar needs acid to stay lively.
        (Sweetness, Above, shift(Acidity, 0.20).clamped(0.2, 0.9)),
        (Sweetness, Above, shift(Tannins, -0.10)),
        (Sweetness, Below, shift(Acidity, -0.10)),
        (Sweetness, Below, shift(Body, -0.10)),
        (Tannins, Above, shift(Body, 0.15)),
        (Tannins, Above, shift(Acidity, -0.10)),
        (Tannins, Below, shift(Body, -0.10)),
        (Tannins, Below, shift(Spice, -0.05)),
    ];

    rules
        .into_iter()
        .fold(RangeAdjustmentConfig::new(), |config, (source, direction, rule)| {
            config.with_rule(source, direction, rule)
        })
}

pub fn penalties() -> Vec<Rule> {
    vec![
        Rule::new(
            "Clashing Sweetness",
            &[Acidity, Sweetness],
            &[Sweetness, Acidity],
            Condition::new(|v| v.acidity > 0.7 && v.sweetness > 0.6),
        )
        .with_k(0.25),
        Rule::new(
            "Astringent Finish",
            &[Acidity, Tannins],
            &[Tannins, Acidity],
            Condition::new(|v| v.acidity > 0.7 && v.tannins > 0.7),
        ),
        Rule::new(
            "Cloying Sweetness",
            &[Sweetness],
            &[Sweetness, Body],
            Condition::new(|v| v.sweetness > 0.7 && v.acidity < 0.35),
        )
        .with_k(0.3)
        .with_cap(1.5),
        Rule::new(
            "Harsh Tannins",
            &[Tannins, Body],
            &[Tannins],
            Condition::new(|v| v.tannins > 0.75 && v.body < 0.4),
        ),
        Rule::new(
            "Overpowering Spice",
            &[Spice],
            &[Spice, Aroma],
            Condition::new(|v| v.spice > 0.75 && v.aroma < 0.35),
        )
        .with_k(0.15),
        Rule::new(
            "Hollow Wine",
            &[Body, Aroma],
            &[Body, Aroma],
            Condition::new(|v| v.body < 0.3 && v.aroma < 0.3),
        )
        .with_p(1.0),
    ]
}

pub fn synergies() -> Vec<Rule> {
    vec![
        Rule::new(
            "Bold Structure",
            &[Tannins, Body],
            &[Tannins, Body],
            Condition::new(|v| v.tannins > 0.6 && v.body > 0.6),
        )
        .with_k(0.25),
        Rule::new(
            "Aromatic Spice",
            &[Aroma, Spice],
            &[Aroma, Spice],
            Condition::new(|v| v.aroma > 0.6 && v.spice > 0.55),
        ),
        Rule::new(
            "Fresh and Crisp",
            &[Acidity, Aroma],
            &[Acidity],
            Condition::new(|v| {
                (0.6..=0.8).contains(&v.acidity) && v.sweetness < 0.4 && v.aroma > 0.5
            }),
        )
        .with_cap(0.5),
        Rule::new(
            "Dessert Harmony",
            &[Sweetness, Body],
            &[Sweetness],
            Condition::new(|v| v.sweetness > 0.7 && v.acidity > 0.55 && v.body > 0.6),
        ),
    ]
}

pub fn rules() -> RuleConfig {
    RuleConfig {
        penalties: penalties(),
        synergies: synergies(),
    }
}
