//! Guaranteed cleanup around scenario bodies.
//!
//! Cleanup steps are best-effort: each failure is recorded and the next step
//! still runs. A panicking body is caught and the teardown runs before the
//! panic resumes, so the test still fails with its original message. A dirty
//! teardown after a panic is appended to that message.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use thiserror::Error;
use tracing::warn;

/// Failures collected while tearing down.
#[derive(Debug, Default)]
pub struct TeardownLog {
    failures: Vec<String>,
}

impl TeardownLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one cleanup step.
    pub fn record<E: fmt::Display>(&mut self, step: &str, result: Result<(), E>) {
        if let Err(e) = result {
            warn!(step, error = %e, "teardown step failed");
            self.failures.push(format!("{step}: {e}"));
        }
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    #[must_use]
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    pub fn into_result(self) -> Result<(), TeardownError> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(TeardownError {
                failures: self.failures,
            })
        }
    }
}

/// One or more cleanup steps failed.
#[derive(Debug, Error)]
#[error("{} teardown step(s) failed{}", .failures.len(), render_failures(.failures))]
pub struct TeardownError {
    pub failures: Vec<String>,
}

fn render_failures(failures: &[String]) -> String {
    failures.iter().map(|f| format!("\n  {f}")).collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "scenario body panicked"
    }
}

/// Runs `body`, then `teardown`, whatever the body did.
///
/// Returns the body's value together with the teardown log, so the caller
/// decides how a dirty teardown ranks against the body's own outcome. A panic
/// in the body resumes once cleanup has finished; if cleanup also failed, the
/// panic is raised again with the teardown failures appended.
pub async fn with_teardown<T, B, D>(body: B, teardown: D) -> (T, TeardownLog)
where
    B: Future<Output = T>,
    D: Future<Output = TeardownLog>,
{
    let outcome = AssertUnwindSafe(body).catch_unwind().await;
    let log = teardown.await;
    match outcome {
        Ok(value) => (value, log),
        Err(panic) => match log.into_result() {
            Ok(()) => std::panic::resume_unwind(panic),
            Err(dirty) => {
                warn!(failures = ?dirty.failures, "teardown after panic left resources behind");
                panic!("{}\nthen {dirty}", panic_message(panic.as_ref()))
            }
        },
    }
}
