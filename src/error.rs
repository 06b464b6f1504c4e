//! Error types for VIGIL
//!
//! Nothing in here can stop a running session. Script errors happen before a
//! session exists, and sink errors are logged and dropped by the runtime.

use std::path::PathBuf;
use thiserror::Error;

/// Loading an authored script failed
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse script {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("script contains no phases")]
    Empty,
}

/// A presentation or audio collaborator failed
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("audio backend unavailable: {0}")]
    AudioUnavailable(String),

    #[error("sink write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error for the binary
#[derive(Debug, Error)]
pub enum VigilError {
    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("failed to encode session transcript: {0}")]
    Transcript(#[from] serde_json::Error),

    #[error("session runner stopped before the terminal locked")]
    Interrupted,
}

impl VigilError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Script(_) => 2,
            Self::Sink(_) => 3,
            Self::Transcript(_) => 1,
            Self::Interrupted => 130,
        }
    }
}
