// src/main.rs — promptsmith entry point

use clap::Parser;

use promptsmith::cli::{run, Cli, Commands};
use promptsmith::infra::config::Config;
use promptsmith::infra::logger;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging (respects RUST_LOG)
    logger::init_logging(if cli.verbose { "debug" } else { "warn" });

    if let Err(e) = dispatch(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    // Load config (falls back to defaults if no config.toml)
    let config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };

    match &cli.command {
        Some(Commands::Modes) => run::show_modes(&config, cli.json),
        Some(Commands::Analyze { prompt, stdin }) => run::run_analyze(prompt, *stdin),
        None => run::run_prompt(&cli, &config).await,
    }
}
