//! CLI error type.

use thiserror::Error;

use texstack::config::ConfigError;
use texstack::logging::LoggingError;
use texstack::ConvertError;

/// Exit code for failures that don't come from a conversion.
const GENERAL_FAILURE: i32 = 0xFF;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Convert(#[from] ConvertError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error("Failed to serialize output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Export incomplete; no encoding for {}", .0.join(", "))]
    ExportIncomplete(Vec<String>),
}

impl CliError {
    /// Process exit code: the result code for conversion failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Convert(e) => e.code() as i32,
            _ => GENERAL_FAILURE,
        }
    }
}
