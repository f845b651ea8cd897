//! CLI error types
//!
//! Every CLI error is fatal: it is printed with its code and the process
//! exits non-zero.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::documents::DocumentError;

/// Failures of `docsign init` and `docsign serve`
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to read config {path}: {source}")]
    ConfigUnreadable { path: PathBuf, source: io::Error },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Data directory {0} already initialized")]
    AlreadyInitialized(PathBuf),

    #[error("Data directory {0} not initialized. Run 'docsign init' first.")]
    NotInitialized(PathBuf),

    #[error("Failed to create {path}: {source}")]
    Layout { path: PathBuf, source: io::Error },

    #[error("Failed to open document records: {0}")]
    Records(#[from] DocumentError),

    #[error("Failed to create tokio runtime: {0}")]
    Runtime(io::Error),

    #[error("HTTP server failed: {0}")]
    Server(io::Error),
}

impl CliError {
    /// Stable code printed in front of the message
    pub fn code(&self) -> &'static str {
        match self {
            CliError::ConfigUnreadable { .. } | CliError::InvalidConfig(_) => {
                "DOCSIGN_CLI_CONFIG_ERROR"
            }
            CliError::AlreadyInitialized(_) => "DOCSIGN_CLI_ALREADY_INITIALIZED",
            CliError::NotInitialized(_) => "DOCSIGN_CLI_NOT_INITIALIZED",
            CliError::Layout { .. } => "DOCSIGN_CLI_IO_ERROR",
            CliError::Records(_) | CliError::Runtime(_) | CliError::Server(_) => {
                "DOCSIGN_CLI_BOOT_FAILED"
            }
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_initialized_names_the_directory() {
        let err = CliError::NotInitialized(PathBuf::from("/var/lib/docsign"));
        assert_eq!(err.code(), "DOCSIGN_CLI_NOT_INITIALIZED");
        assert!(err.to_string().contains("/var/lib/docsign"));
    }

    #[test]
    fn test_record_errors_fail_boot() {
        let err = CliError::from(DocumentError::Internal("bad records".into()));
        assert_eq!(err.code(), "DOCSIGN_CLI_BOOT_FAILED");
        assert!(err.to_string().contains("bad records"));
    }
}
