//! Bazaar CLI binary entrypoint.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use bazaar_cli::cli::{Cli, Commands};
use bazaar_cli::commands::{DeriveCommand, QueryCommand, ReplayCommand};
use bazaar_cli::config::BazaarConfig;
use bazaar_cli::logging;
use bazaar_cli::output::OutputFormat;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(&config.logging);

    match run(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<BazaarConfig> {
    let config = match &cli.config {
        Some(path) => BazaarConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => BazaarConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn run(cli: Cli, config: &BazaarConfig) -> anyhow::Result<()> {
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Derive(args) => {
            DeriveCommand::new().execute(&mut stdout, &format, &args)?;
        }
        Commands::Replay(args) => {
            let report = ReplayCommand::new(config)
                .execute(&mut stdout, &format, &args)
                .with_context(|| format!("replaying {}", args.script.display()))?;
            if report.failures() > 0 {
                tracing::warn!(rejected = report.failures(), "some instructions were rejected");
            }
        }
        Commands::Query(args) => {
            QueryCommand::new()
                .execute(&mut stdout, &format, &args)
                .with_context(|| format!("querying {}", args.snapshot.display()))?;
        }
    }

    Ok(())
}
