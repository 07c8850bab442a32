//! `chimera ingest` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use chimera_core::config::ChimeraConfig;
use chimera_ingest::{IngestEngine, IngestReport};

use crate::cli::IngestArgs;
use crate::error::CliError;
use crate::output::{Reporter, TextView};

/// Execute the `ingest` command.
///
/// With `--source` a single source is ingested; otherwise every enabled
/// source runs in configuration order, and per-source failures are
/// reported without stopping the batch.
pub async fn execute(
    args: IngestArgs,
    config: ChimeraConfig,
    reporter: &Reporter,
) -> Result<(), CliError> {
    let engine = IngestEngine::new(config);

    match &args.source {
        Some(name) => {
            info!(source = name.as_str(), "ingesting single source");
            let outcome = engine
                .ingest_by_name(name, args.window_secs, args.limit)
                .await?;
            reporter.emit(&SingleSourceView {
                source: name.clone(),
                inserted: outcome.inserted,
                total: outcome.total,
            })?;
            Ok(())
        }
        None => {
            info!("ingesting all enabled sources");
            let report = engine.ingest_all(args.window_secs, args.limit).await?;
            let failures = report.failures();
            reporter.emit(&ReportView { report })?;
            if failures > 0 {
                return Err(CliError::SourceFailures(failures));
            }
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct SingleSourceView {
    source: String,
    inserted: u64,
    total: u64,
}

impl TextView for SingleSourceView {
    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(
            out,
            "{}: inserted {} (store total: {})",
            self.source, self.inserted, self.total
        )
    }
}

#[derive(Serialize)]
struct ReportView {
    #[serde(flatten)]
    report: IngestReport,
}

impl TextView for ReportView {
    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        for source in &self.report.sources {
            match &source.error {
                Some(error) => writeln!(out, "{}: FAILED ({error})", source.source)?,
                None => writeln!(out, "{}: inserted {}", source.source, source.inserted)?,
            }
        }
        writeln!(
            out,
            "total inserted: {} (store total: {})",
            self.report.inserted, self.report.total
        )
    }
}
