//! Error types for the CLI runner and platform operations.

use std::path::PathBuf;

use pat_testing::{FixtureError, PollError, TeardownError};
use thiserror::Error;

use crate::session::Exit;

/// Errors from running the platform CLI or talking to pushed apps.
///
/// A non-zero exit is only an error where an operation needs success
/// ([`CfError::CommandFailed`]); [`crate::Cf::run`] itself reports it as data.
#[derive(Debug, Error)]
pub enum CfError {
    #[error("failed to spawn {}: {source}", .binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create a private CF_HOME: {0}")]
    Home(#[source] std::io::Error),

    #[error("`{command}` {exit}\n{output}")]
    CommandFailed {
        command: String,
        exit: Exit,
        output: String,
    },

    #[error("`{command}` did not print {expected:?}\n{output}")]
    UnexpectedOutput {
        command: String,
        expected: String,
        output: String,
    },

    #[error("{var} is not set")]
    NotConfigured { var: &'static str },

    #[error("invalid {var}: {message}")]
    InvalidConfig { var: &'static str, message: String },

    #[error("invalid JSON from `cf curl {path}`: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{kind} {name} is still registered")]
    StillRegistered { kind: &'static str, name: String },

    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error(transparent)]
    Teardown(#[from] TeardownError),
}

impl CfError {
    /// Returns true for a command that ran past its deadline.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::CommandFailed { exit, .. } => matches!(exit, Exit::TimedOut(_)),
            Self::Poll(e) => e.is_timeout(),
            _ => false,
        }
    }
}
