// ABOUTME: Entry point for the testbed CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use std::env;
use std::path::Path;
use testbed::config::{self, EnvironmentConfig, ProvisionSettings};
use testbed::error::{Error, Result};
use testbed::output::{Output, OutputMode};
use testbed::runtime::RuntimeConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };

    if let Err(e) = run(cli, mode).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

fn load_config(file: Option<&Path>) -> Result<EnvironmentConfig> {
    match file {
        Some(path) => EnvironmentConfig::load(path),
        None => EnvironmentConfig::discover(&env::current_dir()?),
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let output = Output::new(mode);
    match cli.command {
        Commands::Init { environment, force } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, environment.as_deref(), force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Plan => {
            let config = load_config(cli.file.as_deref())?;
            commands::plan(&config, &output)
        }
        Commands::Up { timeout } => {
            let config = load_config(cli.file.as_deref())?;
            commands::up(config, timeout, output).await
        }
        Commands::Prune {
            environment,
            older_than,
        } => {
            // A descriptor is optional here; it only contributes runtime settings.
            let (runtime, settings) = match load_config(cli.file.as_deref()) {
                Ok(config) => (config.runtime, config.provision),
                Err(Error::ConfigNotFound(_)) => {
                    (RuntimeConfig::default(), ProvisionSettings::default())
                }
                Err(e) => return Err(e),
            };
            commands::prune(&runtime, &settings, environment.as_deref(), older_than, output)
                .await
        }
    }
}
