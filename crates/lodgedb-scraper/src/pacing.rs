//! Anti-detection pacing: jittered settle pauses between page actions.
//!
//! These are cooperative delays, not a rate limiter — each session throttles
//! itself within the configured range, so detail-pool throughput still
//! scales with the worker count. Every pause is cancellation-aware: a
//! cancelled run never sleeps through its remaining delays.

use std::future::Future;
use std::time::Duration;

use lodgedb_core::ScraperConfig;
use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::error::ScraperError;

/// Produces randomized pauses within a fixed `[min, max]` millisecond range.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    delay_min_ms: u64,
    delay_max_ms: u64,
}

impl Pacer {
    /// Builds a pacer from an already-validated range (`min <= max`).
    #[must_use]
    pub fn new(delay_min_ms: u64, delay_max_ms: u64) -> Self {
        Self {
            delay_min_ms,
            delay_max_ms,
        }
    }

    #[must_use]
    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new(config.delay_min_ms, config.delay_max_ms)
    }

    /// Draws one randomized pause from the configured range.
    #[must_use]
    pub fn delay(&self) -> Duration {
        let delay_ms = if self.delay_min_ms == self.delay_max_ms {
            self.delay_min_ms
        } else {
            rand::rng().random_range(self.delay_min_ms..=self.delay_max_ms)
        };
        Duration::from_millis(delay_ms)
    }

    /// Sleeps for a random duration within the configured range.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Cancelled`] if the token fires before the
    /// pause elapses.
    pub async fn settle(&self, cancel: &CancellationToken) -> Result<(), ScraperError> {
        sleep_cancellable(self.delay(), cancel).await
    }
}

/// Sleeps for `duration` unless `cancel` fires first.
///
/// # Errors
///
/// Returns [`ScraperError::Cancelled`] when the token wins the race.
pub async fn sleep_cancellable(
    duration: Duration,
    cancel: &CancellationToken,
) -> Result<(), ScraperError> {
    tokio::select! {
        () = cancel.cancelled() => Err(ScraperError::Cancelled),
        () = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Races `future` against cancellation, so blocked navigation and visibility
/// waits abort promptly when the run is cancelled.
///
/// # Errors
///
/// Returns [`ScraperError::Cancelled`] when the token wins the race.
pub async fn with_cancel<T, F>(cancel: &CancellationToken, future: F) -> Result<T, ScraperError>
where
    F: Future<Output = T>,
{
    tokio::select! {
        () = cancel.cancelled() => Err(ScraperError::Cancelled),
        value = future => Ok(value),
    }
}
