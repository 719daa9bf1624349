//! Error types for deployerai

use std::fmt;

use thiserror::Error;

use crate::models::review::ReviewRequest;

/// Main error type for deployerai
#[derive(Error, Debug)]
pub enum DeployerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {body}")]
    StatusError { status: u16, body: String },

    #[error("Malformed response body: {0}")]
    DecodeError(String),

    #[error("Construction error: {0}")]
    ConstructionError(String),

    #[error("Credential error: {0}")]
    CredentialError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid outcome: {0}")]
    InvalidOutcome(String),

    #[error("No open pull request found for ticket {0}")]
    NotFound(String),

    #[error("Found {} open pull requests for ticket {ticket}: {}", .candidates.len(), describe(.candidates))]
    Ambiguous {
        ticket: String,
        candidates: Vec<ReviewRequest>,
    },

    #[error("Cancelled: {0}")]
    Cancelled(String),
}

fn describe(candidates: &[ReviewRequest]) -> String {
    candidates
        .iter()
        .map(|pr| format!("{}#{}", pr.repo, pr.number))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failure classification surfaced to front-ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input, missing credentials or settings; never retried
    Construction,
    /// Network failure, timeout or non-success status from a remote call
    Transport,
    /// The oracle answered, but incoherently
    InvalidOutcome,
    NotFound,
    Ambiguous,
    Cancellation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Construction => "construction",
            ErrorKind::Transport => "transport",
            ErrorKind::InvalidOutcome => "invalid outcome",
            ErrorKind::NotFound => "not found",
            ErrorKind::Ambiguous => "ambiguous",
            ErrorKind::Cancellation => "cancelled",
        };
        f.write_str(s)
    }
}

impl DeployerError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeployerError::IoError(_)
            | DeployerError::JsonError(_)
            | DeployerError::ConstructionError(_)
            | DeployerError::CredentialError(_)
            | DeployerError::ConfigError(_) => ErrorKind::Construction,
            DeployerError::HttpError(_)
            | DeployerError::StatusError { .. }
            | DeployerError::DecodeError(_) => ErrorKind::Transport,
            DeployerError::InvalidOutcome(_) => ErrorKind::InvalidOutcome,
            DeployerError::NotFound(_) => ErrorKind::NotFound,
            DeployerError::Ambiguous { .. } => ErrorKind::Ambiguous,
            DeployerError::Cancelled(_) => ErrorKind::Cancellation,
        }
    }

    /// Whether a caller could reasonably try the same call again
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }
}
