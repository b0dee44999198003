//! Eventual assertions.
//!
//! A probe is re-run until its value satisfies a matcher or the timeout
//! elapses. The probe's last value is kept so a timeout can say what was
//! actually observed.

use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, trace};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Reported as the last value when the first probe never finished.
const PENDING_AT_DEADLINE: &str = "nothing, the probe was still running at the deadline";

/// Pause between probes unless overridden.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Named timeout tiers used across the scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeoutTier {
    /// Quick commands and HTTP checks.
    Default,
    /// A single push, staging included.
    Push,
    /// Slow starts and multi-step operations.
    Long,
    /// Staging with a deliberately slow compile.
    Staging,
}

impl TimeoutTier {
    /// Unscaled duration of the tier.
    #[must_use]
    pub const fn base(self) -> Duration {
        match self {
            Self::Default => Duration::from_secs(30),
            Self::Push => Duration::from_secs(120),
            Self::Long => Duration::from_secs(600),
            Self::Staging => Duration::from_secs(1200),
        }
    }

    /// Tier duration multiplied by `scale`.
    #[must_use]
    pub fn scaled(self, scale: f64) -> Duration {
        self.base().mul_f64(scale)
    }
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("condition not met after {waited:?} ({attempts} attempts), last observed: {last}")]
    TimedOut {
        waited: Duration,
        attempts: u32,
        last: String,
    },

    #[error("probe failed on attempt {attempt}: {source}")]
    Probe {
        attempt: u32,
        #[source]
        source: BoxError,
    },
}

impl PollError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

/// Polling policy: how long to keep trying and how often.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eventually {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Eventually {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            interval: DEFAULT_INTERVAL,
        }
    }

    /// Policy for a tier at the given scale.
    #[must_use]
    pub fn tier(tier: TimeoutTier, scale: f64) -> Self {
        Self::new(tier.scaled(scale))
    }

    #[must_use]
    pub const fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Runs `probe` until `matcher` accepts its value.
    ///
    /// The probe always runs at least once, even with a zero timeout. A probe
    /// error ends polling immediately. Neither sleeps nor a slow probe run
    /// past the deadline; a probe still pending there is dropped.
    pub async fn until<T, E, F, Fut, M>(&self, mut probe: F, matcher: M) -> Result<T, PollError>
    where
        T: Debug,
        E: Into<BoxError>,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        M: Fn(&T) -> bool,
    {
        let start = Instant::now();
        let deadline = start + self.timeout;
        let mut attempts = 0u32;
        let mut last: Option<String> = None;

        loop {
            attempts += 1;
            let remaining = deadline.saturating_duration_since(Instant::now());
            let Ok(outcome) = timeout(remaining, probe()).await else {
                return Err(PollError::TimedOut {
                    waited: start.elapsed(),
                    attempts,
                    last: last.unwrap_or_else(|| PENDING_AT_DEADLINE.to_string()),
                });
            };
            let value = outcome.map_err(|e| PollError::Probe {
                attempt: attempts,
                source: e.into(),
            })?;

            if matcher(&value) {
                debug!(attempts, elapsed = ?start.elapsed(), "condition met");
                return Ok(value);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(PollError::TimedOut {
                    waited: now - start,
                    attempts,
                    last: format!("{value:?}"),
                });
            }
            trace!(attempts, last = ?value, "condition not met yet");
            last = Some(format!("{value:?}"));
            sleep(self.interval.min(deadline - now)).await;
        }
    }
}

/// Polls until the probed value satisfies `matcher`.
pub async fn await_match<T, E, F, Fut, M>(
    timeout: Duration,
    probe: F,
    matcher: M,
) -> Result<T, PollError>
where
    T: Debug,
    E: Into<BoxError>,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    M: Fn(&T) -> bool,
{
    Eventually::new(timeout).until(probe, matcher).await
}

/// Polls until the probed text contains `needle`.
pub async fn await_contains<E, F, Fut>(
    timeout: Duration,
    probe: F,
    needle: &str,
) -> Result<String, PollError>
where
    E: Into<BoxError>,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String, E>>,
{
    Eventually::new(timeout)
        .until(probe, |body: &String| body.contains(needle))
        .await
}
