//! chimera CLI entrypoint
//!
//! Loads configuration, initializes tracing, and dispatches subcommands.
//! Errors map to stable exit codes via [`error::CliError::exit_code`].

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::path::Path;

use clap::Parser;

use chimera_core::config::ChimeraConfig;
use chimera_core::error::{ChimeraError, ConfigError};

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::Reporter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => {}
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = load_config(&cli.config).await?;
    if let Some(level) = &cli.log_level {
        config.general.log_level = level.clone();
    }
    config
        .validate()
        .map_err(|e| CliError::Config(e.to_string()))?;

    logging::init_tracing(&config.general)?;
    chimera_core::metrics::describe_all();

    let reporter = Reporter::new(cli.output);
    match cli.command {
        Commands::Ingest(args) => commands::ingest::execute(args, config, &reporter).await,
        Commands::Status(args) => commands::status::execute(args, config, &reporter).await,
        Commands::Sources => commands::sources::execute(config, &reporter),
        Commands::Config(args) => commands::config::execute(args, config, &reporter),
    }
}

/// Load the configuration file, falling back to built-in defaults when the
/// file does not exist. Environment overrides apply in both cases.
async fn load_config(path: &Path) -> Result<ChimeraConfig, CliError> {
    match ChimeraConfig::load(path).await {
        Ok(config) => Ok(config),
        Err(ChimeraError::Config(ConfigError::FileNotFound { .. })) => {
            let mut config = ChimeraConfig::default();
            config.apply_env_overrides();
            Ok(config)
        }
        Err(e) => Err(CliError::Config(e.to_string())),
    }
}
