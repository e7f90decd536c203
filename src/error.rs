//! Error types shared across the shell, document and configuration layers.
//!
//! Evaluation failures are *not* errors at this level: they travel as
//! [`EvaluationResult::Failure`](crate::eval::EvaluationResult::Failure) and are
//! rendered into the output surface. The types here cover contract violations
//! (calling an operation in the wrong state) and I/O around documents and config.

use crate::shell::ShellState;
use std::path::PathBuf;
use thiserror::Error;

/// Rejected shell operations.
///
/// Returning one of these leaves the shell untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShellError {
    /// `submit_for_evaluation` called while an evaluation is outstanding
    #[error("cannot evaluate while {state}")]
    NotIdle { state: ShellState },

    /// `request_abort` called with nothing to abort
    #[error("nothing to abort while {state}")]
    NotEvaluating { state: ShellState },

    /// The document holds no source (whitespace only counts as empty)
    #[error("document is empty")]
    EmptyDocument,
}

/// Document load/save errors
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Save requested for an untitled document without a target path
    #[error("document '{name}' has no file path")]
    NoPath { name: String },
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value: {0}")]
    Invalid(String),
}
