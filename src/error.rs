//! Error types for coverage aggregation.
//!
//! Per-function failures (`InputNotFound`, `MalformedInput`) are contained by
//! the aggregator and turned into skips. `OutputSink` is the only error that
//! ends a batch.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while aggregating branch coverage.
#[derive(Error, Debug)]
pub enum CoverageError {
    #[error("trace file not found or unreadable: {path}")]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed trace file {path}: {reason}")]
    MalformedInput { path: PathBuf, reason: String },

    #[error("failed to write report: {0}")]
    OutputSink(#[from] std::io::Error),
}

impl CoverageError {
    /// Whether the batch can continue after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CoverageError::OutputSink(_))
    }

    /// Short human-readable cause, without the file path.
    pub fn reason(&self) -> String {
        match self {
            CoverageError::InputNotFound { source, .. } => source.to_string(),
            CoverageError::MalformedInput { reason, .. } => reason.clone(),
            CoverageError::OutputSink(e) => e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_recoverable_errors() {
        let missing = CoverageError::InputNotFound {
            path: PathBuf::from("test_03.csv"),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file"),
        };
        let malformed = CoverageError::MalformedInput {
            path: PathBuf::from("test_04.csv"),
            reason: "row 2 has 2 columns, expected 3".to_string(),
        };
        let sink = CoverageError::OutputSink(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));

        assert!(missing.is_recoverable());
        assert!(malformed.is_recoverable());
        assert!(!sink.is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let malformed = CoverageError::MalformedInput {
            path: PathBuf::from("test_04.csv"),
            reason: "no runs recorded".to_string(),
        };
        assert_eq!(
            malformed.to_string(),
            "malformed trace file test_04.csv: no runs recorded"
        );
        assert_eq!(malformed.reason(), "no runs recorded");
    }
}
