//! `chimera status` command handler

use std::io::Write;

use serde::Serialize;

use chimera_core::config::ChimeraConfig;
use chimera_store::LogStore;

use crate::cli::StatusArgs;
use crate::error::CliError;
use crate::output::{Reporter, TextView};

/// Execute the `status` command.
///
/// Reads store totals and per-source cursors. Read-only: never mutates
/// the store beyond ensuring the schema exists.
pub async fn execute(
    args: StatusArgs,
    config: ChimeraConfig,
    reporter: &Reporter,
) -> Result<(), CliError> {
    let store = LogStore::open(&config.storage.db_path).map_err(chimera_core::ChimeraError::from)?;

    let severities = if args.verbose {
        Some(
            store
                .severity_counts()
                .map_err(chimera_core::ChimeraError::from)?
                .into_iter()
                .map(|(severity, rows)| SeverityRow { severity, rows })
                .collect(),
        )
    } else {
        None
    };

    let view = StatusView {
        db_path: config.storage.db_path.clone(),
        total_rows: store
            .total_rows()
            .map_err(chimera_core::ChimeraError::from)?,
        cursors: store
            .cursors()
            .map_err(chimera_core::ChimeraError::from)?
            .into_iter()
            .map(|c| CursorRow {
                source: c.source,
                cursor: c.cursor,
                updated_at: c.updated_at,
            })
            .collect(),
        severities,
    };
    reporter.emit(&view)
}

#[derive(Serialize)]
struct StatusView {
    db_path: String,
    total_rows: u64,
    cursors: Vec<CursorRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    severities: Option<Vec<SeverityRow>>,
}

#[derive(Serialize)]
struct CursorRow {
    source: String,
    cursor: Option<String>,
    updated_at: String,
}

#[derive(Serialize)]
struct SeverityRow {
    severity: String,
    rows: u64,
}

impl TextView for StatusView {
    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "store: {}", self.db_path)?;
        writeln!(out, "rows:  {}", self.total_rows)?;
        if self.cursors.is_empty() {
            writeln!(out, "cursors: (none)")?;
        } else {
            writeln!(out, "cursors:")?;
            for cursor in &self.cursors {
                writeln!(
                    out,
                    "  {} -> {} ({})",
                    cursor.source,
                    cursor.cursor.as_deref().unwrap_or("-"),
                    cursor.updated_at
                )?;
            }
        }
        if let Some(severities) = &self.severities {
            writeln!(out, "by severity:")?;
            for row in severities {
                writeln!(out, "  {:>8}  {}", row.severity, row.rows)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_view_renders_cursor_lines() {
        let view = StatusView {
            db_path: "/tmp/c.db".to_owned(),
            total_rows: 42,
            cursors: vec![CursorRow {
                source: "system-journald".to_owned(),
                cursor: Some("cursor-2".to_owned()),
                updated_at: "2024-01-15T10:30:45Z".to_owned(),
            }],
            severities: None,
        };
        let mut buf = Vec::new();
        view.write_text(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("rows:  42"));
        assert!(text.contains("system-journald -> cursor-2"));
    }

    #[test]
    fn empty_cursor_table_renders_placeholder() {
        let view = StatusView {
            db_path: "/tmp/c.db".to_owned(),
            total_rows: 0,
            cursors: Vec::new(),
            severities: None,
        };
        let mut buf = Vec::new();
        view.write_text(&mut buf).unwrap();
        assert!(String::from_utf8(buf).unwrap().contains("cursors: (none)"));
    }
}
