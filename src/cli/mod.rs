// src/cli/mod.rs — CLI definition (clap derive)

pub mod progress;
pub mod run;

use clap::{Parser, Subcommand};

use crate::core::modes::{BudgetOverrides, FEATURE_CACHING, FEATURE_DYNAMIC_ANALYSIS};

#[derive(Parser)]
#[command(
    name = "promptsmith",
    about = "Budget-constrained prompt refinement",
    version
)]
pub struct Cli {
    /// Prompt to refine (default command when no subcommand given)
    #[arg(trailing_var_arg = true)]
    pub prompt: Vec<String>,

    /// Read the prompt from stdin
    #[arg(long)]
    pub stdin: bool,

    /// Budget mode: fast, balanced, thorough, research
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Engine: refine (self-critique loop) or enhance (layered pipeline)
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// Quality target to stop at (0-10)
    #[arg(long)]
    pub target: Option<f32>,

    /// Max critique iterations
    #[arg(long)]
    pub max_iterations: Option<u8>,

    /// Max oracle calls for the whole run
    #[arg(long)]
    pub max_calls: Option<u32>,

    /// Disable the response cache
    #[arg(long)]
    pub no_cache: bool,

    /// Skip oracle-backed domain analysis
    #[arg(long)]
    pub no_dynamic: bool,

    /// Print the full result and trace as JSON
    #[arg(long)]
    pub json: bool,

    /// Suppress progress output (only emit the final prompt)
    #[arg(long)]
    pub quiet: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Config file path
    #[arg(long)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the budget modes with their resolved settings
    Modes,
    /// Print the static analysis of a prompt as JSON (no oracle calls)
    Analyze {
        #[arg(trailing_var_arg = true)]
        prompt: Vec<String>,
        /// Read the prompt from stdin
        #[arg(long)]
        stdin: bool,
    },
}

impl Cli {
    /// Budget overrides given on the command line. Highest precedence.
    pub fn overrides(&self) -> BudgetOverrides {
        let mut overrides = BudgetOverrides {
            target_quality_score: self.target,
            max_iterations: self.max_iterations,
            max_oracle_calls: self.max_calls,
            show_progress: self.quiet.then_some(false),
            ..Default::default()
        };
        if self.no_cache {
            overrides.features.insert(FEATURE_CACHING.into(), false);
        }
        if self.no_dynamic {
            overrides
                .features
                .insert(FEATURE_DYNAMIC_ANALYSIS.into(), false);
        }
        overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prompt_words() {
        let cli = Cli::parse_from(["promptsmith", "write", "a", "poem"]);
        assert_eq!(cli.prompt, vec!["write", "a", "poem"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from([
            "promptsmith",
            "-m",
            "thorough",
            "-s",
            "enhance",
            "--max-calls",
            "5",
            "--no-cache",
            "--json",
            "hello",
        ]);
        assert_eq!(cli.mode.as_deref(), Some("thorough"));
        assert_eq!(cli.strategy.as_deref(), Some("enhance"));
        assert_eq!(cli.max_calls, Some(5));
        assert!(cli.no_cache);
        assert!(cli.json);
    }

    #[test]
    fn test_overrides_from_flags() {
        let cli = Cli::parse_from([
            "promptsmith",
            "--target",
            "9.5",
            "--no-dynamic",
            "--quiet",
            "x",
        ]);
        let o = cli.overrides();
        assert_eq!(o.target_quality_score, Some(9.5));
        assert_eq!(o.show_progress, Some(false));
        assert_eq!(o.features.get(FEATURE_DYNAMIC_ANALYSIS), Some(&false));
        assert!(!o.features.contains_key(FEATURE_CACHING));
        assert_eq!(o.max_iterations, None);
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::parse_from(["promptsmith", "modes"]);
        assert!(matches!(cli.command, Some(Commands::Modes)));

        let cli = Cli::parse_from(["promptsmith", "analyze", "sort", "numbers"]);
        match cli.command {
            Some(Commands::Analyze { prompt, stdin }) => {
                assert_eq!(prompt, vec!["sort", "numbers"]);
                assert!(!stdin);
            }
            _ => panic!("expected analyze"),
        }
    }
}
