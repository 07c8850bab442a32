//! CLI argument parsing using clap derive API
//!
//! This module is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Chimera LogMind -- log ingestion and query engine.
///
/// Use `chimera <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "chimera", version, about, long_about = None)]
pub struct Cli {
    /// Path to the chimera.toml configuration file.
    #[arg(short, long, default_value = "chimera.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest logs from one source, or all enabled sources.
    Ingest(IngestArgs),

    /// Show store totals and per-source cursors.
    Status(StatusArgs),

    /// List configured log sources.
    Sources,

    /// Inspect or validate the effective configuration.
    Config(ConfigArgs),
}

// ---- ingest ----

/// Run a one-shot ingestion pass.
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Source name to ingest (default: all enabled sources).
    #[arg(long)]
    pub source: Option<String>,

    /// Look back window in seconds when no cursor is stored
    /// (default: ingest.default_window_secs from config).
    #[arg(long)]
    pub window_secs: Option<u64>,

    /// Cap on entries per source (clamped to ingest.max_limit).
    #[arg(long)]
    pub limit: Option<usize>,
}

// ---- status ----

/// Display store row counts and cursor positions.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Also show per-severity row counts.
    #[arg(short, long)]
    pub verbose: bool,
}

// ---- config ----

/// Inspect the effective configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration (after env overrides).
    Show,
    /// Validate the configuration file and exit.
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn ingest_args_parse() {
        let cli = Cli::parse_from([
            "chimera",
            "ingest",
            "--source",
            "system-journald",
            "--window-secs",
            "600",
            "--limit",
            "100",
        ]);
        match cli.command {
            Commands::Ingest(args) => {
                assert_eq!(args.source.as_deref(), Some("system-journald"));
                assert_eq!(args.window_secs, Some(600));
                assert_eq!(args.limit, Some(100));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn default_config_path() {
        let cli = Cli::parse_from(["chimera", "sources"]);
        assert_eq!(cli.config, PathBuf::from("chimera.toml"));
    }

    #[test]
    fn json_output_flag() {
        let cli = Cli::parse_from(["chimera", "status", "--output", "json"]);
        assert!(matches!(cli.output, OutputFormat::Json));
    }
}
