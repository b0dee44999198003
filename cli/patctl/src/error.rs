//! Error handling and display for the CLI.

use colored::Colorize;
use pat_cf::CfError;
use pat_testing::{FixtureError, PollError};
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{path} is not a buildpack fixture: missing {entry}")]
    NotAFixture { path: String, entry: String },
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    if let Some(hint) = hint_for(err) {
        eprintln!("\n{}", format!("Hint: {hint}").yellow());
    }
}

fn hint_for(err: &anyhow::Error) -> Option<&'static str> {
    if let Some(cf_err) = err.downcast_ref::<CfError>() {
        return match cf_err {
            CfError::NotConfigured { .. } => {
                Some("Export PAT_API, PAT_APPS_DOMAIN and PAT_ADMIN_PASSWORD to reach a live platform.")
            }
            CfError::Spawn { .. } => Some("Install the cf CLI or point PAT_CF_BINARY at it."),
            e if e.is_timeout() => Some("Raise PAT_TIMEOUT_SCALE on slow platforms."),
            _ => None,
        };
    }
    if let Some(poll_err) = err.downcast_ref::<PollError>() {
        if poll_err.is_timeout() {
            return Some("The condition may need longer; try a larger --timeout.");
        }
    }
    if let Some(FixtureError::InvalidDescriptor { .. }) = err.downcast_ref::<FixtureError>() {
        return Some("Check the --app name and that --env names match [A-Za-z_][A-Za-z0-9_]*.");
    }
    match err.downcast_ref::<CliError>() {
        Some(CliError::NotAFixture { .. }) => {
            Some("Build one with `pat fixture build --app <name> -o <zip>`.")
        }
        _ => None,
    }
}
