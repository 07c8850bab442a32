//! `chimera sources` command handler

use std::io::Write;

use serde::Serialize;

use chimera_core::config::ChimeraConfig;

use crate::error::CliError;
use crate::output::{Reporter, TextView};

/// Execute the `sources` command: list configured sources.
pub fn execute(config: ChimeraConfig, reporter: &Reporter) -> Result<(), CliError> {
    let view = SourcesView {
        sources: config
            .sources
            .iter()
            .map(|s| SourceRow {
                name: s.name.clone(),
                kind: s.kind.to_string(),
                enabled: s.enabled,
            })
            .collect(),
    };
    reporter.emit(&view)
}

#[derive(Serialize)]
struct SourcesView {
    sources: Vec<SourceRow>,
}

#[derive(Serialize)]
struct SourceRow {
    name: String,
    kind: String,
    enabled: bool,
}

impl TextView for SourcesView {
    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        for source in &self.sources {
            writeln!(
                out,
                "{:<24} {:<10} {}",
                source.name,
                source.kind,
                if source.enabled { "enabled" } else { "disabled" }
            )?;
        }
        Ok(())
    }
}
