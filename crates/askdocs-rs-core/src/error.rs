//! Error types for the core crate.

use askdocs_rs_protocol::SessionId;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by conversation state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    /// The operation is not valid in the current exchange state.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
    /// Question text was empty or whitespace.
    #[error("question must not be empty")]
    EmptyQuestion,
    /// A question is already being answered.
    #[error("a question is already in flight")]
    InFlight,
    /// A result came back for a session that has since ended.
    #[error("result belongs to ended session {session_id}")]
    StaleResult { session_id: SessionId },
}

/// Errors returned by the access gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// The typed password did not match.
    #[error("That is not correct. Please try again.")]
    IncorrectPassword,
}

/// Errors returned by secrets providers.
#[derive(Debug, Error)]
pub enum SecretsError {
    /// The configured environment variable is not set.
    #[error("secret env var {0} is not set")]
    MissingEnv(String),
    /// The secret file could not be read.
    #[error("failed to read secret file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The secret payload was not the expected JSON shape.
    #[error("malformed secret {secret_id}: {message}")]
    Malformed { secret_id: String, message: String },
    /// A required key was absent or empty.
    #[error("secret {secret_id} is missing key {key}")]
    MissingKey { secret_id: String, key: &'static str },
}
