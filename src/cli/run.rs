// src/cli/run.rs — Default command: refine a prompt, plus the modes/analyze helpers

use anyhow::{bail, Context};
use std::io::{IsTerminal, Read};

use super::Cli;
use crate::analyzer::static_analysis;
use crate::core::modes::{self, BudgetConfig, Mode, FEATURE_PROGRESSIVE, FEATURE_SELF_REFINE};
use crate::core::progressive::ProgressiveEnhancer;
use crate::core::self_refine::SelfRefine;
use crate::core::types::Strategy;
use crate::infra::config::Config;
use crate::oracle;

/// Join the positional words, or read stdin when asked (or when no words
/// were given and stdin is piped).
pub fn read_prompt(words: &[String], stdin: bool) -> anyhow::Result<String> {
    let text = if reads_stdin(words, stdin, std::io::stdin().is_terminal()) {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read prompt from stdin")?;
        buf
    } else {
        words.join(" ")
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        bail!("no prompt given (pass it as arguments or use --stdin)");
    }
    Ok(text)
}

/// An interactive terminal is only read when `--stdin` asks for it.
fn reads_stdin(words: &[String], stdin: bool, stdin_is_terminal: bool) -> bool {
    stdin || (words.is_empty() && !stdin_is_terminal)
}

/// Mode defaults < config `[overrides]` < CLI flags, then range checks.
pub fn resolve_budget(cli: &Cli, config: &Config) -> anyhow::Result<(Mode, BudgetConfig)> {
    let mode = match cli.mode.as_deref() {
        Some(name) => name.parse::<Mode>()?,
        None => config.defaults.mode,
    };
    let overrides = config.overrides.clone().merged_with(&cli.overrides());
    let budget = modes::resolve(mode, &overrides);

    let violations = modes::validate(&budget);
    if !violations.is_empty() {
        for v in &violations {
            eprintln!("invalid setting: {v}");
        }
        bail!("{} invalid budget setting(s)", violations.len());
    }
    Ok((mode, budget))
}

/// Run the selected engine over the prompt and print the result.
pub async fn run_prompt(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let text = read_prompt(&cli.prompt, cli.stdin)?;
    let (mode, budget) = resolve_budget(cli, config)?;
    let strategy = match cli.strategy.as_deref() {
        Some(name) => name.parse::<Strategy>()?,
        None => config.defaults.strategy,
    };

    let feature = match strategy {
        Strategy::Refine => FEATURE_SELF_REFINE,
        Strategy::Enhance => FEATURE_PROGRESSIVE,
    };
    if !budget.feature(feature) {
        bail!("strategy '{strategy}' is disabled (feature '{feature}' is off)");
    }

    let oracle = oracle::from_config(&config.oracle)?;
    let timeout = oracle::timeout_from_config(&config.oracle);
    let show_progress = budget.show_progress && !cli.quiet;

    if show_progress {
        eprintln!(
            "[{strategy}] mode={mode} target={:.1} calls<={} | oracle: {}",
            budget.target_quality_score,
            budget.max_oracle_calls,
            oracle.id(),
        );
    }

    match strategy {
        Strategy::Refine => {
            let mut engine = SelfRefine::new(oracle).with_timeout(timeout);
            if show_progress {
                engine = engine.with_progress(super::progress::terminal_progress());
            }
            let result = engine.run(&text, &budget).await;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result.final_unit);
                if show_progress {
                    eprintln!(
                        "  score {:.1} -> {:.1} after {} scored iteration(s) ({})",
                        result.baseline_score,
                        result.final_score(),
                        result.applied_iterations(),
                        result.stop_reason
                    );
                }
            }
        }
        Strategy::Enhance => {
            let mut engine = ProgressiveEnhancer::new(oracle).with_timeout(timeout);
            if show_progress {
                engine = engine.with_progress(super::progress::terminal_progress());
            }
            let result = engine.run(&text, &budget).await;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result.final_unit);
            }
        }
    }

    Ok(())
}

/// `promptsmith modes`: every mode with config `[overrides]` applied.
pub fn show_modes(config: &Config, json: bool) -> anyhow::Result<()> {
    let resolved: Vec<(Mode, BudgetConfig)> = Mode::ALL
        .iter()
        .map(|m| (*m, modes::resolve(*m, &config.overrides)))
        .collect();

    if json {
        let map: std::collections::BTreeMap<&str, &BudgetConfig> =
            resolved.iter().map(|(m, b)| (m.as_str(), b)).collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    println!(
        "{:<10} {:>6} {:>6} {:>6} {:>9}  features",
        "mode", "target", "iters", "calls", "progress"
    );
    for (mode, b) in &resolved {
        let enabled: Vec<&str> = b
            .features
            .iter()
            .filter(|(_, on)| **on)
            .map(|(name, _)| name.as_str())
            .collect();
        let marker = if *mode == config.defaults.mode { "*" } else { "" };
        println!(
            "{:<10} {:>6.1} {:>6} {:>6} {:>9}  {}",
            format!("{mode}{marker}"),
            b.target_quality_score,
            b.max_iterations,
            b.max_oracle_calls,
            b.show_progress,
            enabled.join(", ")
        );
    }
    Ok(())
}

/// `promptsmith analyze`: static analysis only, no oracle.
pub fn run_analyze(words: &[String], stdin: bool) -> anyhow::Result<()> {
    let text = read_prompt(words, stdin)?;
    let report = static_analysis::analyze(&text);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
