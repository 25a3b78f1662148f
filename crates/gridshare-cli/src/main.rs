//! Gridshare scenario runner
//!
//! Replays marketplace scenarios against an in-process ledger and reports
//! each call's result in the host's rendering.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gridshare_cli::{render_run, write_snapshot, CliConfig, OutputFormat, Scenario};
use gridshare_core::PrincipalId;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gridshare")]
#[command(about = "Gridshare - peer-to-peer energy marketplace ledger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, default_value = "gridshare.toml")]
    config: PathBuf,

    /// Ledger owner principal (overrides config and GRIDSHARE_OWNER)
    #[arg(long, global = true)]
    owner: Option<PrincipalId>,

    /// Report format (overrides config)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario against a fresh ledger
    Run {
        /// Scenario TOML file
        scenario: PathBuf,

        /// Write the final ledger snapshot to this JSON file
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
    },

    /// Parse and validate a scenario without running it
    Check {
        /// Scenario TOML file
        scenario: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flag
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { scenario, snapshot } => {
            let config = CliConfig::resolve(&cli.config, cli.owner, cli.format)
                .context("failed to resolve configuration")?;
            let loaded = Scenario::load(&scenario)?;
            loaded.validate()?;

            let run = loaded.run(config.ledger);
            println!("{}", render_run(&run, config.output.format)?);

            if let Some(path) = snapshot {
                write_snapshot(&run, &path)?;
            }

            let mismatches = run.mismatches().count();
            if mismatches > 0 {
                anyhow::bail!("{mismatches} step(s) did not match their expectation");
            }
        }

        Commands::Check { scenario } => {
            let loaded = Scenario::load(&scenario)?;
            loaded.validate()?;
            println!("{}: {} steps ok", scenario.display(), loaded.steps.len());
        }
    }

    Ok(())
}
