//! Vintner Headless Balance Harness
//!
//! Validates the balance scoring logic and the shipped config data without
//! the game client. Runs entirely in-process with no DB, networking or UI.
//!
//! Usage:
//!   cargo run -p vintner-simtest
//!   cargo run -p vintner-simtest -- --verbose
//!   cargo run -p vintner-simtest -- --config my_balance.json --samples 10000
//!   RUST_LOG=vintner_logic=trace cargo run -p vintner-simtest

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vintner_logic::characteristics::{Characteristic, CharacteristicVector};
use vintner_logic::config::BalanceConfig;
use vintner_logic::quality::BalanceTier;
use vintner_logic::range_adjust::adjust_ranges;
use vintner_logic::ranges::MIN_RANGE_WIDTH;
use vintner_logic::rules::EvaluationOptions;

// ── Shipped balance config (same JSON the game loads) ───────────────────
const CONFIG_JSON: &str = include_str!("../../../data/balance_config.json");

#[derive(Debug, Parser)]
#[command(name = "vintner-simtest", about = "Headless wine balance harness")]
struct Args {
    /// Print per-scenario detail even for passing checks.
    #[arg(short, long)]
    verbose: bool,

    /// Balance config to validate instead of the bundled one.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random wines scored in the sweep.
    #[arg(long, default_value_t = 2000)]
    samples: usize,

    /// Seed for the random sweep.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    println!("=== Vintner Balance Harness ===\n");

    let json = match &args.config {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading balance config {}", path.display()))?,
        None => CONFIG_JSON.to_string(),
    };

    let mut results = Vec::new();

    // 1. Config parse + agreement with built-in tables
    let config = match BalanceConfig::from_json(&json) {
        Ok(config) => {
            results.push(TestResult {
                name: "config_parse".into(),
                passed: true,
                detail: format!(
                    "{} shift rules, {} penalties, {} synergies",
                    config.range_shifts.rule_count(),
                    config.rules.penalties.len(),
                    config.rules.synergies.len()
                ),
            });
            config
        }
        Err(e) => {
            log::error!("balance config rejected: {}", e);
            results.push(TestResult {
                name: "config_parse".into(),
                passed: false,
                detail: e.to_string(),
            });
            return finish(&results, args.verbose);
        }
    };
    if args.config.is_none() {
        results.extend(validate_against_defaults(&config));
    }

    let wines = random_wines(args.samples, args.seed);

    // 2. Range adjustment invariants
    results.extend(validate_range_adjustment(&config, &wines));

    // 3. Rule effect bounds
    results.extend(validate_rules(&config, &wines));

    // 4. Scoring properties
    results.extend(validate_scoring(&config, &wines));

    // 5. Named wine profiles
    results.extend(validate_scenarios(&config, args.verbose));

    finish(&results, args.verbose)
}

fn finish(results: &[TestResult], verbose: bool) -> Result<()> {
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn random_wines(samples: usize, seed: u64) -> Vec<CharacteristicVector> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..samples)
        .map(|_| CharacteristicVector::from_fn(|_| rng.gen_range(0.0..=1.0)))
        .collect()
}

fn midpoint_wine(config: &BalanceConfig) -> CharacteristicVector {
    CharacteristicVector::from_fn(|c| config.baseline[c].midpoint())
}

// ── 1. Config ───────────────────────────────────────────────────────────

fn validate_against_defaults(config: &BalanceConfig) -> Vec<TestResult> {
    println!("--- Config ---");
    let mut results = Vec::new();
    let built_in = BalanceConfig::default();

    results.push(TestResult {
        name: "config_baseline_matches_builtin".into(),
        passed: config.baseline == built_in.baseline,
        detail: "bundled baseline ranges equal built-in defaults".into(),
    });

    results.push(TestResult {
        name: "config_shifts_match_builtin".into(),
        passed: config.range_shifts == built_in.range_shifts,
        detail: format!(
            "{} bundled vs {} built-in shift rules",
            config.range_shifts.rule_count(),
            built_in.range_shifts.rule_count()
        ),
    });

    // Closures can't be compared directly, so compare what they do.
    let probes = random_wines(500, 7);
    let mismatches = probes
        .iter()
        .filter(|w| config.score(w).score.to_bits() != built_in.score(w).score.to_bits())
        .count();
    results.push(TestResult {
        name: "config_rules_match_builtin".into(),
        passed: mismatches == 0,
        detail: format!("{} of {} probe wines score differently", mismatches, probes.len()),
    });

    results
}

// ── 2. Range Adjustment ─────────────────────────────────────────────────

fn validate_range_adjustment(
    config: &BalanceConfig,
    wines: &[CharacteristicVector],
) -> Vec<TestResult> {
    println!("--- Range Adjustment ---");
    let mut results = Vec::new();

    let mut out_of_unit = 0;
    let mut too_narrow = 0;
    let mut narrowest = f64::MAX;
    for wine in wines {
        let adjusted = adjust_ranges(wine, &config.baseline, &config.range_shifts);
        for (_, r) in adjusted.iter() {
            if r.min < 0.0 || r.max > 1.0 {
                out_of_unit += 1;
            }
            if r.width() < MIN_RANGE_WIDTH {
                too_narrow += 1;
            }
            narrowest = narrowest.min(r.width());
        }
    }
    results.push(TestResult {
        name: "ranges_within_unit".into(),
        passed: out_of_unit == 0,
        detail: format!("{} ranges outside [0, 1]", out_of_unit),
    });
    results.push(TestResult {
        name: "ranges_min_width".into(),
        passed: too_narrow == 0,
        detail: format!("narrowest adjusted range {:.4}", narrowest),
    });

    let centered = midpoint_wine(config);
    let adjusted = adjust_ranges(&centered, &config.baseline, &config.range_shifts);
    results.push(TestResult {
        name: "ranges_identity_at_baseline".into(),
        passed: adjusted == config.baseline,
        detail: "midpoint wine leaves every range untouched".into(),
    });

    results
}

// ── 3. Rules ────────────────────────────────────────────────────────────

fn validate_rules(config: &BalanceConfig, wines: &[CharacteristicVector]) -> Vec<TestResult> {
    println!("--- Rules ---");
    let mut results = Vec::new();

    let mut cap_violations = 0;
    let mut bad_multipliers = 0;
    let mut bad_reductions = 0;
    let mut fired = 0usize;
    for wine in wines {
        let eval = config.evaluate(wine, EvaluationOptions::FULL);
        for d in eval
            .penalty_breakdown
            .iter()
            .chain(eval.synergy_breakdown.iter())
            .flatten()
        {
            fired += 1;
            if d.capped_effect > d.cap {
                cap_violations += 1;
            }
        }
        bad_multipliers += eval.penalty_scaling.iter().filter(|(_, m)| **m < 1.0).count();
        bad_reductions += eval
            .synergy_reductions
            .iter()
            .filter(|(_, r)| !(0.0..=1.0).contains(*r))
            .count();
    }

    results.push(TestResult {
        name: "rules_caps_respected".into(),
        passed: cap_violations == 0,
        detail: format!("{} firings, {} over cap", fired, cap_violations),
    });
    results.push(TestResult {
        name: "rules_penalty_at_least_one".into(),
        passed: bad_multipliers == 0,
        detail: format!("{} multipliers below 1", bad_multipliers),
    });
    results.push(TestResult {
        name: "rules_synergy_in_unit".into(),
        passed: bad_reductions == 0,
        detail: format!("{} reductions outside [0, 1]", bad_reductions),
    });

    let quiet = config.evaluate(&midpoint_wine(config), EvaluationOptions::FULL);
    let quiet_count = quiet.contributions.map(|c| c.len()).unwrap_or(0);
    results.push(TestResult {
        name: "rules_silent_at_baseline".into(),
        passed: quiet_count == 0,
        detail: format!("{} rules fire on the midpoint wine", quiet_count),
    });

    results
}

// ── 4. Scoring ──────────────────────────────────────────────────────────

fn validate_scoring(config: &BalanceConfig, wines: &[CharacteristicVector]) -> Vec<TestResult> {
    println!("--- Scoring ---");
    let mut results = Vec::new();

    let mut nondeterministic = 0;
    let mut out_of_bounds = 0;
    let mut inconsistent = 0;
    let mut tiers = [0usize; 5];
    for wine in wines {
        let first = config.score(wine);
        let second = config.score(wine);
        if first.score.to_bits() != second.score.to_bits() {
            nondeterministic += 1;
        }
        if !(0.0..=1.0).contains(&first.score) {
            out_of_bounds += 1;
        }
        if config.breakdown(wine).score.to_bits() != first.score.to_bits() {
            inconsistent += 1;
        }
        tiers[first.tier() as usize] += 1;
    }

    results.push(TestResult {
        name: "scoring_deterministic".into(),
        passed: nondeterministic == 0,
        detail: format!("{} of {} wines differ on repeat", nondeterministic, wines.len()),
    });
    results.push(TestResult {
        name: "scoring_bounded".into(),
        passed: out_of_bounds == 0,
        detail: format!("{} scores outside [0, 1]", out_of_bounds),
    });
    results.push(TestResult {
        name: "scoring_breakdown_consistent".into(),
        passed: inconsistent == 0,
        detail: format!("{} breakdowns disagree with score", inconsistent),
    });

    let perfect = config.score(&midpoint_wine(config)).score;
    results.push(TestResult {
        name: "scoring_perfect_balance".into(),
        passed: perfect == 1.0,
        detail: format!("midpoint wine scores {:.4}", perfect),
    });

    println!(
        "  tier spread: unbalanced={} rough={} decent={} harmonious={} exquisite={}",
        tiers[0], tiers[1], tiers[2], tiers[3], tiers[4]
    );

    results
}

// ── 5. Scenarios ────────────────────────────────────────────────────────

fn validate_scenarios(config: &BalanceConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Scenarios ---");
    let mut results = Vec::new();
    let centered = midpoint_wine(config);

    let clashing = centered
        .with(Characteristic::Acidity, 0.9)
        .with(Characteristic::Sweetness, 0.9);
    let with_rule = config.score(&clashing).score;
    let without = BalanceConfig {
        rules: config.rules.without("Clashing Sweetness"),
        ..config.clone()
    }
    .score(&clashing)
    .score;
    results.push(TestResult {
        name: "scenario_clashing_sweetness".into(),
        passed: with_rule < without,
        detail: format!("{:.4} with rule vs {:.4} without", with_rule, without),
    });

    let profiles = [
        ("Balanced table wine", centered),
        (
            "Bold red",
            CharacteristicVector {
                acidity: 0.55,
                aroma: 0.6,
                body: 0.85,
                spice: 0.6,
                sweetness: 0.35,
                tannins: 0.8,
            },
        ),
        (
            "Crisp white",
            CharacteristicVector {
                acidity: 0.72,
                aroma: 0.65,
                body: 0.45,
                spice: 0.3,
                sweetness: 0.3,
                tannins: 0.2,
            },
        ),
        (
            "Late harvest",
            CharacteristicVector {
                acidity: 0.6,
                aroma: 0.7,
                body: 0.75,
                spice: 0.4,
                sweetness: 0.9,
                tannins: 0.3,
            },
        ),
        (
            "Flawed batch",
            CharacteristicVector {
                acidity: 0.2,
                aroma: 0.2,
                body: 0.15,
                spice: 0.9,
                sweetness: 0.85,
                tannins: 0.9,
            },
        ),
    ];

    for (name, wine) in &profiles {
        let b = config.breakdown(wine);
        if verbose {
            let fired: Vec<String> = b
                .rules
                .contributions
                .iter()
                .flatten()
                .map(|c| format!("{:?}:{}", c.kind, c.rule))
                .collect();
            println!(
                "  {:20} score={:.3} tier={:10} rules=[{}]",
                name,
                b.score,
                b.tier().label(),
                fired.join(", ")
            );
            if let Some(worst) = b
                .characteristics
                .iter()
                .map(|(_, c)| c)
                .max_by(|x, y| x.total_distance.total_cmp(&y.total_distance))
            {
                println!(
                    "  {:20} worst={} value={:.2} range=[{:.3}, {:.3}] {:?}",
                    "",
                    worst.characteristic,
                    worst.value,
                    worst.adjusted_range.min,
                    worst.adjusted_range.max,
                    worst.status
                );
            }
        }
    }
    let flawed = profiles
        .iter()
        .find(|(name, _)| *name == "Flawed batch")
        .map(|(_, wine)| config.score(wine).tier());
    results.push(TestResult {
        name: "scenario_flawed_batch_low".into(),
        passed: matches!(flawed, Some(tier) if tier <= BalanceTier::Rough),
        detail: match flawed {
            Some(tier) => format!("flawed batch rated {}", tier.label()),
            None => "flawed batch profile missing".into(),
        },
    });

    results
}
