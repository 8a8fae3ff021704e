//! Error types for the message pipeline and its collaborators.

use std::path::PathBuf;
use thiserror::Error;

/// Failures talking to the mail provider.
#[derive(Debug, Error)]
pub enum MailError {
    /// Underlying HTTP client error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider answered with a non-success status.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    /// Could not obtain credentials for the request.
    #[error("authentication error: {0}")]
    Auth(String),
}

/// Failure submitting a file to the printer.
#[derive(Debug, Error)]
pub enum PrintError {
    #[error("could not run print command '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("print command rejected '{path}': {reason}")]
    Rejected { path: PathBuf, reason: String },
}

/// Per-message processing failures. Each one is contained to the message it
/// happened on.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("{context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: MailError,
    },
    #[error("could not decode attachment '{filename}': {source}")]
    Decode {
        filename: String,
        source: base64::DecodeError,
    },
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ProcessError {
    pub fn transport(context: impl Into<String>, source: MailError) -> Self {
        Self::Transport {
            context: context.into(),
            source,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
