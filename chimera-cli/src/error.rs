//! CLI-specific error types and exit code mapping

use chimera_core::error::ChimeraError;
use chimera_ingest::IngestError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to stable Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// Ingestion failed for the requested source.
    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// One or more sources failed during `ingest` over all sources.
    #[error("{0} source(s) failed")]
    SourceFailures(usize),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from chimera-core.
    #[error("{0}")]
    Core(#[from] ChimeraError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                               |
    /// |------|---------------------------------------|
    /// | 0    | Success                               |
    /// | 1    | General / command error               |
    /// | 2    | Configuration error                   |
    /// | 4    | Ingestion failure (full or partial)   |
    /// | 10   | IO error                              |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Ingest(_) | Self::SourceFailures(_) => 4,
            Self::Io(_) => 10,
            Self::Core(ChimeraError::Config(_)) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_stable() {
        assert_eq!(CliError::Config("x".to_owned()).exit_code(), 2);
        assert_eq!(CliError::SourceFailures(1).exit_code(), 4);
        assert_eq!(CliError::Command("x".to_owned()).exit_code(), 1);
        assert_eq!(
            CliError::Io(std::io::Error::other("boom")).exit_code(),
            10
        );
    }

    #[test]
    fn config_errors_from_core_map_to_config_exit_code() {
        let core_err = ChimeraError::Config(chimera_core::error::ConfigError::InvalidValue {
            field: "general.log_level".to_owned(),
            reason: "bad".to_owned(),
        });
        assert_eq!(CliError::Core(core_err).exit_code(), 2);
    }
}
