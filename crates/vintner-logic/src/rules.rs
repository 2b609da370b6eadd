//! Penalty and synergy rules.
//!
//! Both rule classes share one formula. A firing rule measures how far its
//! source characteristics deviate from their baseline midpoints, turns that
//! into an effect `k * deviation^p` capped at `cap`, and applies the effect to
//! its targets:
//!
//! | Kind | Effect on target | Neutral value |
//! |------|------------------|---------------|
//! | Penalty | distance multiplier `1 + effect` | 1.0 |
//! | Synergy | distance reduction `effect` | 0.0 |
//!
//! Overlapping rules combine by `max` per target: the strongest rule wins and
//! two moderate rules never add up to a severe one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::characteristics::{Characteristic, CharacteristicVector, PerCharacteristic};
use crate::conditions::Condition;
use crate::ranges::BaselineRangeTable;

pub const DEFAULT_K: f64 = 0.2;
pub const DEFAULT_P: f64 = 1.2;
pub const DEFAULT_PENALTY_CAP: f64 = 2.0;
pub const DEFAULT_SYNERGY_CAP: f64 = 0.75;

/// Which side of the ledger a rule sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Penalty,
    Synergy,
}

impl RuleKind {
    pub fn default_cap(&self) -> f64 {
        match self {
            Self::Penalty => DEFAULT_PENALTY_CAP,
            Self::Synergy => DEFAULT_SYNERGY_CAP,
        }
    }
}

/// A configured penalty or synergy.
///
/// `k`, `p` and `cap` are optional; omitted values fall back to the
/// defaults for the rule's kind.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub sources: Vec<Characteristic>,
    pub targets: Vec<Characteristic>,
    pub condition: Condition,
    pub k: Option<f64>,
    pub p: Option<f64>,
    pub cap: Option<f64>,
}

impl Rule {
    pub fn new(
        name: impl Into<String>,
        sources: &[Characteristic],
        targets: &[Characteristic],
        condition: Condition,
    ) -> Self {
        Self {
            name: name.into(),
            sources: sources.to_vec(),
            targets: targets.to_vec(),
            condition,
            k: None,
            p: None,
            cap: None,
        }
    }

    pub fn with_k(mut self, k: f64) -> Self {
        self.k = Some(k);
        self
    }

    pub fn with_p(mut self, p: f64) -> Self {
        self.p = Some(p);
        self
    }

    pub fn with_cap(mut self, cap: f64) -> Self {
        self.cap = Some(cap);
        self
    }

    /// `k`, or [`DEFAULT_K`] when missing, non-finite or negative.
    pub fn effective_k(&self) -> f64 {
        self.k
            .filter(|k| k.is_finite() && *k >= 0.0)
            .unwrap_or(DEFAULT_K)
    }

    /// `p`, or [`DEFAULT_P`] when missing, non-finite or not positive.
    pub fn effective_p(&self) -> f64 {
        self.p
            .filter(|p| p.is_finite() && *p > 0.0)
            .unwrap_or(DEFAULT_P)
    }

    /// `cap`, or the kind's default when missing, non-finite or negative.
    /// Synergy caps are held to `[0, 1]`.
    pub fn effective_cap(&self, kind: RuleKind) -> f64 {
        let cap = self
            .cap
            .filter(|c| c.is_finite() && *c >= 0.0)
            .unwrap_or_else(|| kind.default_cap());
        match kind {
            RuleKind::Penalty => cap,
            RuleKind::Synergy => cap.min(1.0),
        }
    }

    /// Sources joined with `+`, e.g. `acidity+sweetness`.
    pub fn source_key(&self) -> String {
        self.sources
            .iter()
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join("+")
    }
}

/// Penalty and synergy rule lists.
#[derive(Debug, Clone, Default)]
pub struct RuleConfig {
    pub penalties: Vec<Rule>,
    pub synergies: Vec<Rule>,
}

impl RuleConfig {
    /// Iterate every rule tagged with its kind, penalties first.
    pub fn iter(&self) -> impl Iterator<Item = (RuleKind, &Rule)> + '_ {
        self.penalties
            .iter()
            .map(|r| (RuleKind::Penalty, r))
            .chain(self.synergies.iter().map(|r| (RuleKind::Synergy, r)))
    }

    /// Copy of this config with every rule named `name` removed.
    pub fn without(&self, name: &str) -> Self {
        Self {
            penalties: self
                .penalties
                .iter()
                .filter(|r| r.name != name)
                .cloned()
                .collect(),
            synergies: self
                .synergies
                .iter()
                .filter(|r| r.name != name)
                .cloned()
                .collect(),
        }
    }
}

/// What extra output [`evaluate_rules`] should produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationOptions {
    /// Record each firing rule's uncollapsed per-target multipliers.
    pub dry_run: bool,
    /// Record a full diagnostic for each firing rule.
    pub detailed: bool,
}

impl EvaluationOptions {
    pub const PLAIN: Self = Self {
        dry_run: false,
        detailed: false,
    };

    pub const FULL: Self = Self {
        dry_run: true,
        detailed: true,
    };
}

/// One firing rule's effect, before combination across rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleContribution {
    pub rule: String,
    pub kind: RuleKind,
    /// Sources joined with `+`.
    pub source_key: String,
    /// Distance multiplier per target: `1 + effect` for penalties,
    /// `1 - effect` for synergies.
    pub targets: BTreeMap<Characteristic, f64>,
}

/// Display record for one firing rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDiagnostic {
    pub name: String,
    pub kind: RuleKind,
    pub sources: Vec<Characteristic>,
    pub targets: Vec<Characteristic>,
    pub avg_deviation: f64,
    pub k: f64,
    pub p: f64,
    pub cap: f64,
    pub raw_effect: f64,
    pub capped_effect: f64,
    pub cap_hit: bool,
    pub effect_percent: f64,
}

/// Result of evaluating a rule config against one vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEvaluation {
    /// Distance multiplier per characteristic, `>= 1`.
    pub penalty_scaling: PerCharacteristic<f64>,
    /// Distance reduction per characteristic, `0..=cap`.
    pub synergy_reductions: PerCharacteristic<f64>,
    /// Filled when [`EvaluationOptions::dry_run`] is set.
    pub contributions: Option<Vec<RuleContribution>>,
    /// Filled when [`EvaluationOptions::detailed`] is set.
    pub penalty_breakdown: Option<Vec<RuleDiagnostic>>,
    /// Filled when [`EvaluationOptions::detailed`] is set.
    pub synergy_breakdown: Option<Vec<RuleDiagnostic>>,
}

impl RuleEvaluation {
    fn neutral(options: EvaluationOptions) -> Self {
        Self {
            penalty_scaling: PerCharacteristic::splat(1.0),
            synergy_reductions: PerCharacteristic::splat(0.0),
            contributions: options.dry_run.then(Vec::new),
            penalty_breakdown: options.detailed.then(Vec::new),
            synergy_breakdown: options.detailed.then(Vec::new),
        }
    }
}

/// Mean absolute deviation of `sources` from their baseline midpoints, in
/// units of baseline half-width. Zero when there are no sources.
pub fn average_deviation(
    vector: &CharacteristicVector,
    baseline: &BaselineRangeTable,
    sources: &[Characteristic],
) -> f64 {
    if sources.is_empty() {
        return 0.0;
    }
    let total: f64 = sources
        .iter()
        .map(|&c| {
            let range = &baseline[c];
            ((vector[c] - range.midpoint()) / range.safe_half_width()).abs()
        })
        .sum();
    total / sources.len() as f64
}

/// `(raw, capped)` effect for a deviation: `k * deviation^p`, capped.
///
/// The capped effect lies in `[0, cap]`. A NaN raw effect counts as no effect.
pub fn scaled_effect(avg_deviation: f64, k: f64, p: f64, cap: f64) -> (f64, f64) {
    let raw = k * avg_deviation.powf(p);
    if raw.is_nan() {
        return (raw, 0.0);
    }
    (raw, raw.min(cap).max(0.0))
}

/// Evaluate every penalty and synergy rule against `vector`.
///
/// Rules whose condition is false are skipped entirely. The dry-run and
/// detailed outputs come from the same pass as the combined tables.
pub fn evaluate_rules(
    vector: &CharacteristicVector,
    baseline: &BaselineRangeTable,
    rules: &RuleConfig,
    options: EvaluationOptions,
) -> RuleEvaluation {
    let mut result = RuleEvaluation::neutral(options);

    for (kind, rule) in rules.iter() {
        if !rule.condition.holds(vector) {
            continue;
        }

        let avg_deviation = average_deviation(vector, baseline, &rule.sources);
        let k = rule.effective_k();
        let p = rule.effective_p();
        let cap = rule.effective_cap(kind);
        let (raw_effect, capped_effect) = scaled_effect(avg_deviation, k, p, cap);

        log::trace!(
            "{:?} '{}' fired: deviation={:.4} raw={:.4} capped={:.4}",
            kind,
            rule.name,
            avg_deviation,
            raw_effect,
            capped_effect
        );

        for &target in &rule.targets {
            match kind {
                RuleKind::Penalty => {
                    let slot = &mut result.penalty_scaling[target];
                    *slot = slot.max(1.0 + capped_effect);
                }
                RuleKind::Synergy => {
                    let slot = &mut result.synergy_reductions[target];
                    *slot = slot.max(capped_effect);
                }
            }
        }

        if let Some(contributions) = result.contributions.as_mut() {
            let factor = match kind {
                RuleKind::Penalty => 1.0 + capped_effect,
                RuleKind::Synergy => 1.0 - capped_effect,
            };
            contributions.push(RuleContribution {
                rule: rule.name.clone(),
                kind,
                source_key: rule.source_key(),
                targets: rule.targets.iter().map(|&t| (t, factor)).collect(),
            });
        }

        let diagnostics = match kind {
            RuleKind::Penalty => result.penalty_breakdown.as_mut(),
            RuleKind::Synergy => result.synergy_breakdown.as_mut(),
        };
        if let Some(diagnostics) = diagnostics {
            diagnostics.push(RuleDiagnostic {
                name: rule.name.clone(),
                kind,
                sources: rule.sources.clone(),
                targets: rule.targets.clone(),
                avg_deviation,
                k,
                p,
                cap,
                raw_effect,
                capped_effect,
                cap_hit: raw_effect > cap,
                effect_percent: capped_effect * 100.0,
            });
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranges::Range;
    use Characteristic::*;

    fn flat_baseline() -> BaselineRangeTable {
        BaselineRangeTable::splat(Range::new(0.4, 0.6))
    }

    fn penalty_only(rules: Vec<Rule>) -> RuleConfig {
        RuleConfig {
            penalties: rules,
            synergies: Vec::new(),
        }
    }

    #[test]
    fn test_no_rules_is_neutral() {
        let eval = evaluate_rules(
            &CharacteristicVector::splat(0.9),
            &flat_baseline(),
            &RuleConfig::default(),
            EvaluationOptions::PLAIN,
        );
        assert_eq!(eval.penalty_scaling, PerCharacteristic::splat(1.0));
        assert_eq!(eval.synergy_reductions, PerCharacteristic::splat(0.0));
        assert!(eval.contributions.is_none());
        assert!(eval.penalty_breakdown.is_none());
    }

    #[test]
    fn test_false_condition_skipped() {
        let rules = penalty_only(vec![Rule::new(
            "never",
            &[Acidity],
            &[Sweetness],
            Condition::new(|_| false),
        )]);
        let eval = evaluate_rules(
            &CharacteristicVector::splat(1.0),
            &flat_baseline(),
            &rules,
            EvaluationOptions::FULL,
        );
        assert_eq!(eval.penalty_scaling.sweetness, 1.0);
        assert_eq!(eval.contributions, Some(Vec::new()));
        assert_eq!(eval.penalty_breakdown, Some(Vec::new()));
    }

    #[test]
    fn test_average_deviation() {
        // acidity: |0.9 - 0.5| / 0.1 = 4, body: |0.5 - 0.5| / 0.1 = 0
        let v = CharacteristicVector::splat(0.5).with(Acidity, 0.9);
        let avg = average_deviation(&v, &flat_baseline(), &[Acidity, Body]);
        assert!((avg - 2.0).abs() < 1e-9);
        assert_eq!(average_deviation(&v, &flat_baseline(), &[]), 0.0);
    }

    #[test]
    fn test_penalty_formula_and_defaults() {
        let rules = penalty_only(vec![Rule::new(
            "p",
            &[Acidity],
            &[Sweetness],
            Condition::always(),
        )]);
        // deviation = |0.6 - 0.5| / 0.1 = 1.0 -> raw = 0.2 * 1^1.2 = 0.2
        let v = CharacteristicVector::splat(0.5).with(Acidity, 0.6);
        let eval = evaluate_rules(&v, &flat_baseline(), &rules, EvaluationOptions::PLAIN);
        assert!((eval.penalty_scaling.sweetness - 1.2).abs() < 1e-9);
        assert_eq!(eval.penalty_scaling.acidity, 1.0);
    }

    #[test]
    fn test_cap_respected_at_extreme_deviation() {
        let rules = penalty_only(vec![Rule::new(
            "huge",
            &[Acidity],
            &[Acidity],
            Condition::always(),
        )
        .with_k(50.0)
        .with_cap(0.5)]);
        let v = CharacteristicVector::splat(0.5).with(Acidity, 1.0);
        let eval = evaluate_rules(&v, &flat_baseline(), &rules, EvaluationOptions::FULL);
        assert!((eval.penalty_scaling.acidity - 1.5).abs() < 1e-12);
        let detail = &eval.penalty_breakdown.unwrap()[0];
        assert!(detail.cap_hit);
        assert_eq!(detail.capped_effect, 0.5);
        assert!(detail.raw_effect > detail.cap);
        assert!((detail.effect_percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_caps_per_kind() {
        let rule = Rule::new("r", &[Body], &[Body], Condition::always());
        assert_eq!(rule.effective_cap(RuleKind::Penalty), DEFAULT_PENALTY_CAP);
        assert_eq!(rule.effective_cap(RuleKind::Synergy), DEFAULT_SYNERGY_CAP);
        assert_eq!(rule.clone().with_cap(1.0).effective_cap(RuleKind::Synergy), 1.0);
    }

    fn acidity_penalty(rule: Rule, acidity: f64) -> RuleEvaluation {
        let v = CharacteristicVector::splat(0.5).with(Acidity, acidity);
        evaluate_rules(&v, &flat_baseline(), &penalty_only(vec![rule]), EvaluationOptions::PLAIN)
    }

    fn sweetness_rule() -> Rule {
        Rule::new("p", &[Acidity], &[Sweetness], Condition::always())
    }

    #[test]
    fn test_nan_k_falls_back_to_default() {
        // deviation 1.0 -> default effect 0.2
        let eval = acidity_penalty(sweetness_rule().with_k(f64::NAN), 0.6);
        assert!((eval.penalty_scaling.sweetness - 1.2).abs() < 1e-9);
        let eval = acidity_penalty(sweetness_rule().with_k(f64::INFINITY), 0.6);
        assert!((eval.penalty_scaling.sweetness - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_negative_k_falls_back_to_default() {
        let eval = acidity_penalty(sweetness_rule().with_k(-1.0), 0.6);
        assert!((eval.penalty_scaling.sweetness - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_bad_p_falls_back_to_default() {
        // deviation 2.0 -> default effect 0.2 * 2^1.2
        let expected = 1.0 + DEFAULT_K * 2.0_f64.powf(DEFAULT_P);
        for p in [0.0, -1.0, f64::NAN] {
            let eval = acidity_penalty(sweetness_rule().with_p(p), 0.7);
            assert!(
                (eval.penalty_scaling.sweetness - expected).abs() < 1e-9,
                "p={p}"
            );
        }
    }

    #[test]
    fn test_bad_penalty_cap_falls_back_to_default() {
        for cap in [f64::NAN, -0.5, f64::INFINITY] {
            let eval = acidity_penalty(sweetness_rule().with_k(100.0).with_cap(cap), 0.6);
            assert_eq!(
                eval.penalty_scaling.sweetness,
                1.0 + DEFAULT_PENALTY_CAP,
                "cap={cap}"
            );
        }
    }

    #[test]
    fn test_synergy_cap_held_to_unit() {
        let rule = Rule::new("s", &[Spice], &[Spice], Condition::always())
            .with_k(100.0)
            .with_cap(3.0);
        assert_eq!(rule.effective_cap(RuleKind::Synergy), 1.0);
        let rules = RuleConfig {
            penalties: Vec::new(),
            synergies: vec![rule],
        };
        let v = CharacteristicVector::splat(0.5).with(Spice, 1.0);
        let eval = evaluate_rules(&v, &flat_baseline(), &rules, EvaluationOptions::PLAIN);
        assert_eq!(eval.synergy_reductions.spice, 1.0);
    }

    #[test]
    fn test_scaled_effect_never_negative_or_nan() {
        assert_eq!(scaled_effect(f64::NAN, 0.2, 1.2, 2.0).1, 0.0);
        assert_eq!(scaled_effect(1.0, -0.2, 1.2, 2.0).1, 0.0);
        assert_eq!(scaled_effect(1.0, 5.0, 1.0, 2.0).1, 2.0);
    }

    #[test]
    fn test_penalties_combine_by_max() {
        let weak = Rule::new("weak", &[Acidity], &[Sweetness], Condition::always()).with_k(0.1);
        let strong =
            Rule::new("strong", &[Acidity], &[Sweetness], Condition::always()).with_k(0.3);
        let v = CharacteristicVector::splat(0.5).with(Acidity, 0.6);
        let eval = evaluate_rules(
            &v,
            &flat_baseline(),
            &penalty_only(vec![weak, strong]),
            EvaluationOptions::PLAIN,
        );
        // deviation 1.0: effects 0.1 and 0.3 -> max wins, not 1.4
        assert!((eval.penalty_scaling.sweetness - 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_synergies_combine_by_max() {
        let rules = RuleConfig {
            penalties: Vec::new(),
            synergies: vec![
                Rule::new("a", &[Body], &[Body, Tannins], Condition::always()).with_k(0.2),
                Rule::new("b", &[Body], &[Tannins], Condition::always()).with_k(0.4),
            ],
        };
        let v = CharacteristicVector::splat(0.5).with(Body, 0.6);
        let eval = evaluate_rules(&v, &flat_baseline(), &rules, EvaluationOptions::PLAIN);
        assert!((eval.synergy_reductions.body - 0.2).abs() < 1e-9);
        assert!((eval.synergy_reductions.tannins - 0.4).abs() < 1e-9);
        assert_eq!(eval.penalty_scaling, PerCharacteristic::splat(1.0));
    }

    #[test]
    fn test_synergy_capped_by_default() {
        let rules = RuleConfig {
            penalties: Vec::new(),
            synergies: vec![Rule::new("s", &[Spice], &[Spice], Condition::always()).with_k(10.0)],
        };
        let v = CharacteristicVector::splat(0.5).with(Spice, 1.0);
        let eval = evaluate_rules(&v, &flat_baseline(), &rules, EvaluationOptions::PLAIN);
        assert_eq!(eval.synergy_reductions.spice, DEFAULT_SYNERGY_CAP);
    }

    #[test]
    fn test_dry_run_keeps_rules_separate() {
        let rules = RuleConfig {
            penalties: vec![
                Rule::new("weak", &[Acidity, Sweetness], &[Sweetness], Condition::always())
                    .with_k(0.1),
                Rule::new("strong", &[Acidity], &[Sweetness, Body], Condition::always())
                    .with_k(0.3),
            ],
            synergies: vec![Rule::new("soft", &[Body], &[Body], Condition::always())],
        };
        let v = CharacteristicVector::splat(0.5)
            .with(Acidity, 0.6)
            .with(Sweetness, 0.6)
            .with(Body, 0.6);
        let eval = evaluate_rules(
            &v,
            &flat_baseline(),
            &rules,
            EvaluationOptions {
                dry_run: true,
                detailed: false,
            },
        );
        let contributions = eval.contributions.unwrap();
        assert_eq!(contributions.len(), 3);
        assert_eq!(contributions[0].source_key, "acidity+sweetness");
        assert!((contributions[0].targets[&Sweetness] - 1.1).abs() < 1e-9);
        assert!((contributions[1].targets[&Body] - 1.3).abs() < 1e-9);
        assert_eq!(contributions[2].kind, RuleKind::Synergy);
        assert!((contributions[2].targets[&Body] - 0.8).abs() < 1e-9);
        assert!(eval.penalty_breakdown.is_none());
    }

    #[test]
    fn test_modes_agree_on_combined_tables() {
        let rules = RuleConfig {
            penalties: vec![Rule::new("p", &[Tannins], &[Tannins], Condition::always())],
            synergies: vec![Rule::new("s", &[Aroma], &[Spice], Condition::always())],
        };
        let v = CharacteristicVector::splat(0.7).with(Aroma, 0.2);
        let plain = evaluate_rules(&v, &flat_baseline(), &rules, EvaluationOptions::PLAIN);
        let full = evaluate_rules(&v, &flat_baseline(), &rules, EvaluationOptions::FULL);
        assert_eq!(plain.penalty_scaling, full.penalty_scaling);
        assert_eq!(plain.synergy_reductions, full.synergy_reductions);
        assert_eq!(full.synergy_breakdown.unwrap().len(), 1);
    }

    #[test]
    fn test_without_removes_named_rule() {
        let rules = penalty_only(vec![
            Rule::new("keep", &[Body], &[Body], Condition::always()),
            Rule::new("drop", &[Body], &[Body], Condition::always()),
        ]);
        let trimmed = rules.without("drop");
        assert_eq!(trimmed.penalties.len(), 1);
        assert_eq!(trimmed.penalties[0].name, "keep");
    }
}
