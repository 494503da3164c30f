//! Exponential back-off retry shared by every network-calling stage.
//!
//! [`retry_with_backoff`] wraps one fallible async operation. Errors decide
//! for themselves whether another attempt is worthwhile via [`Transient`];
//! everything else is returned on the first failure. Sleeps between attempts
//! race a [`CancellationToken`] so a shutdown never waits out a back-off.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Classifies an error as worth retrying after a back-off delay.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// Attempt limit and back-off schedule for [`retry_with_backoff`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. `0` behaves like `1`.
    pub max_attempts: u32,
    /// Sleep before the second attempt.
    pub initial_delay: Duration,
    /// Factor applied to the delay after every failed attempt.
    pub multiplier: u32,
    /// Upper bound for any single sleep.
    pub max_delay: Duration,
    /// Spread each sleep by a random ±25 %.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            multiplier: 2,
            max_delay: Duration::from_secs(60),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that retries `max_attempts` times without sleeping.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            multiplier: 1,
            max_delay: Duration::ZERO,
            jitter: false,
        }
    }

    /// Delay before the attempt following failed attempt number `attempt`
    /// (1-based), ignoring jitter.
    ///
    /// | Failed attempt | Sleep (1 s initial, ×2)   |
    /// |----------------|---------------------------|
    /// | 1              | 1 s                       |
    /// | 2              | 2 s                       |
    /// | 3              | 4 s                       |
    #[must_use]
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let initial_ms = u64::try_from(self.initial_delay.as_millis()).unwrap_or(u64::MAX);
        let factor = u64::from(self.multiplier).saturating_pow(attempt.saturating_sub(1));
        let max_ms = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(initial_ms.saturating_mul(factor).min(max_ms))
    }

    fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if !self.jitter || base.is_zero() {
            return base;
        }
        base.mul_f64(rand::random::<f64>() * 0.5 + 0.75)
    }
}

/// Runs `operation` until it succeeds, fails with a non-transient error,
/// exhausts `policy.max_attempts`, or `cancel` fires.
///
/// Already-completed work outside `operation` is never repeated; callers
/// wrap only the network round-trip.
///
/// # Errors
///
/// Returns the last error produced by `operation`.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T, E>
where
    E: Transient + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_transient() || attempt >= max_attempts || cancel.is_cancelled() {
            return Err(err);
        }

        let delay = policy.delay(attempt);
        tracing::warn!(
            attempt,
            max_attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "transient upstream error, retrying after back-off"
        );

        tokio::select! {
            () = cancel.cancelled() => {
                tracing::debug!(attempt, "retry cancelled during back-off");
                return Err(err);
            }
            () = tokio::time::sleep(delay) => {}
        }
        attempt += 1;
    }
}
