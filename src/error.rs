//! Unified error type for the hostrank library.
//!
//! Library code returns [`HostrankError`]; the CLI binary wraps it in
//! `anyhow::Result` for convenience.
//!
//! # Error Categories
//!
//! - **Config**: unreadable/unwritable directory, bad run parameters — fatal
//!   for the whole run.
//! - **Io**: file system operations (open, read, write) with path context.
//! - **Format**: malformed sequence or side file — recoverable at the batch
//!   level (the offending unit is skipped with a warning).
//! - **Serialization**: truncated or corrupt model file — fatal for a
//!   prediction run rather than a source of silent garbage scores.
//! - **Validation**: invalid parameters or data invariants (order out of
//!   range, negative alpha, empty training input).
//! - **Numeric**: evaluation over zero windows, smoothing with alpha = 0 on
//!   an unobserved context.

use std::fmt;
use std::path::PathBuf;

/// Unified error type for the hostrank library.
#[derive(Debug)]
pub enum HostrankError {
    /// Run configuration error (directories, parameters). Aborts the run.
    Config { path: PathBuf, detail: String },

    /// I/O error with path and operation context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: std::io::Error,
    },

    /// Malformed input data (sequence file, null-fit row).
    Format { path: PathBuf, detail: String },

    /// Corrupt or truncated model file.
    Serialization { path: PathBuf, detail: String },

    /// Invalid parameters or data invariants (order out of range, empty
    /// training input).
    Validation(String),

    /// Numeric anomaly that has no sensible default result.
    Numeric(String),
}

impl fmt::Display for HostrankError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostrankError::Config { path, detail } => {
                write!(f, "Configuration error for '{}': {}", path.display(), detail)
            }
            HostrankError::Io {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "I/O error during {} on '{}': {}",
                    operation,
                    path.display(),
                    source
                )
            }
            HostrankError::Format { path, detail } => {
                write!(f, "Invalid format in '{}': {}", path.display(), detail)
            }
            HostrankError::Serialization { path, detail } => {
                write!(f, "Corrupt model file '{}': {}", path.display(), detail)
            }
            HostrankError::Validation(msg) => write!(f, "Validation error: {}", msg),
            HostrankError::Numeric(msg) => write!(f, "Numeric error: {}", msg),
        }
    }
}

impl std::error::Error for HostrankError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HostrankError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using HostrankError.
pub type Result<T> = std::result::Result<T, HostrankError>;

impl HostrankError {
    /// Create a configuration error.
    pub fn config(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        HostrankError::Config {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, operation: &'static str, source: std::io::Error) -> Self {
        HostrankError::Io {
            path: path.into(),
            operation,
            source,
        }
    }

    /// Create a format error.
    pub fn format(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        HostrankError::Format {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        HostrankError::Serialization {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        HostrankError::Validation(msg.into())
    }

    /// Create a numeric-anomaly error.
    pub fn numeric(msg: impl Into<String>) -> Self {
        HostrankError::Numeric(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let err = HostrankError::io(
            "/models/ecoli.mm",
            "read",
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/models/ecoli.mm"));
        assert!(msg.contains("read"));
        assert!(msg.contains("file not found"));
    }

    #[test]
    fn test_config_error_display() {
        let err = HostrankError::config("/results", "not a writable directory");
        let msg = err.to_string();
        assert!(msg.contains("/results"));
        assert!(msg.contains("not a writable directory"));
    }

    #[test]
    fn test_serialization_error_display() {
        let err = HostrankError::serialization("/models/x.mm", "truncated header");
        let msg = err.to_string();
        assert!(msg.contains("/models/x.mm"));
        assert!(msg.contains("truncated header"));
    }

    #[test]
    fn test_numeric_error_display() {
        let err = HostrankError::numeric("no scorable window");
        assert!(err.to_string().contains("no scorable window"));
    }

    #[test]
    fn test_error_source_chain() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err = HostrankError::io("/path", "open", io_err);
        assert!(std::error::Error::source(&err).is_some());

        let err = HostrankError::numeric("x");
        assert!(std::error::Error::source(&err).is_none());
    }
}
