//! `chimera config` command handler

use std::io::Write;

use serde::Serialize;

use chimera_core::config::ChimeraConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{Reporter, TextView};

/// Execute the `config` command.
pub fn execute(
    args: ConfigArgs,
    config: ChimeraConfig,
    reporter: &Reporter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Show => {
            let toml = toml::to_string_pretty(&config)
                .map_err(|e| CliError::Command(format!("failed to render config: {e}")))?;
            reporter.emit(&ConfigView { config, toml })
        }
        ConfigAction::Validate => {
            config.validate()?;
            reporter.emit(&ValidView {
                valid: true,
                sources: config.sources.len(),
            })
        }
    }
}

#[derive(Serialize)]
struct ConfigView {
    #[serde(flatten)]
    config: ChimeraConfig,
    #[serde(skip)]
    toml: String,
}

impl TextView for ConfigView {
    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        write!(out, "{}", self.toml)
    }
}

#[derive(Serialize)]
struct ValidView {
    valid: bool,
    sources: usize,
}

impl TextView for ValidView {
    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "configuration OK ({} sources)", self.sources)
    }
}
