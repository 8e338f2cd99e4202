//! Error type shared by the gates.
//!
//! Gates never surface these to the host. `gates::evaluate_safely` logs them
//! and substitutes the gate's fail-open decision.

use std::path::PathBuf;
use thiserror::Error;

use crate::process::ProcessError;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid pattern `{pattern}`: {reason}")]
    Pattern { pattern: String, reason: String },

    #[error("{program}: {source}")]
    Process {
        program: String,
        #[source]
        source: ProcessError,
    },

    #[error("invalid config {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("gate panicked: {0}")]
    Panic(String),
}

impl GateError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GateError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, GateError>;
