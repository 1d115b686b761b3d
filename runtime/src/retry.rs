//! Bounded retry with a delay between attempts.
//!
//! Attempts run strictly one after another: each attempt finishes (success,
//! retryable failure or terminal failure) before the delay for the next one
//! starts. A [`CancellationToken`] lets the owner abandon the loop; it is
//! observed both while an attempt is in flight and while waiting.
//!
//! # Example
//!
//! ```rust
//! use ourbusway_runtime::retry::{RetryPolicy, retry_with_predicate};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() {
//! let policy = RetryPolicy::builder()
//!     .max_attempts(5)
//!     .delay(Duration::from_millis(100))
//!     .build();
//!
//! let result = retry_with_predicate(
//!     &policy,
//!     &CancellationToken::new(),
//!     |_attempt| async { Ok::<_, String>(42) },
//!     |err: &String| err.contains("not ready"),
//! )
//! .await;
//! assert_eq!(result.ok(), Some(42));
//! # }
//! ```

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Retry policy configuration.
///
/// # Default Values
///
/// - `max_attempts`: 10
/// - `delay`: 500ms
/// - `multiplier`: 1.0 (fixed delay)
/// - `max_delay`: 30 seconds
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one (at least 1)
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub delay: Duration,
    /// Growth factor applied to the delay after each further failure
    pub multiplier: f64,
    /// Cap on any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::payment_initialization()
    }
}

impl RetryPolicy {
    /// Policy used while waiting for the backend to materialize a payment intent:
    /// 10 attempts, 500ms apart.
    #[must_use]
    pub const fn payment_initialization() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_millis(500),
            multiplier: 1.0,
            max_delay: Duration::from_secs(30),
        }
    }

    /// Create a new policy builder.
    #[must_use]
    pub const fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            policy: Self::payment_initialization(),
        }
    }

    /// Delay to wait after the failed attempt number `attempt` (1-based).
    ///
    /// `delay * multiplier^(attempt - 1)`, capped at `max_delay`. A multiplier
    /// below 1.0 (or NaN) gives a fixed delay.
    #[must_use]
    pub fn delay_after_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        if exponent == 0 || self.multiplier.is_nan() || self.multiplier <= 1.0 {
            return self.delay.min(self.max_delay);
        }

        let factor = self.multiplier.powi(i32::try_from(exponent).unwrap_or(i32::MAX));
        let delay_secs = self.delay.as_secs_f64() * factor;
        if !delay_secs.is_finite() || delay_secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(delay_secs)
    }

    /// Worst-case total waiting time across all delays (no request time included).
    #[must_use]
    pub fn total_delay_budget(&self) -> Duration {
        (1..self.max_attempts).map(|n| self.delay_after_attempt(n)).sum()
    }
}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    /// Set maximum number of attempts (values below 1 are raised to 1).
    #[must_use]
    pub const fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.policy.max_attempts = if max_attempts == 0 { 1 } else { max_attempts };
        self
    }

    /// Set the delay after the first failure.
    #[must_use]
    pub const fn delay(mut self, delay: Duration) -> Self {
        self.policy.delay = delay;
        self
    }

    /// Set the delay growth factor (values below 1.0, and NaN, become 1.0).
    #[must_use]
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.policy.multiplier = if multiplier >= 1.0 { multiplier } else { 1.0 };
        self
    }

    /// Set the cap on any single delay.
    #[must_use]
    pub const fn max_delay(mut self, delay: Duration) -> Self {
        self.policy.max_delay = delay;
        self
    }

    /// Build the [`RetryPolicy`].
    #[must_use]
    pub const fn build(self) -> RetryPolicy {
        self.policy
    }
}

/// Progress of one retry loop. Lives only for the duration of the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState<E> {
    /// Current attempt (1-based)
    pub attempt: u32,
    /// Error observed on the previous attempt
    pub last_error: Option<E>,
}

impl<E> RetryState<E> {
    const fn new() -> Self {
        Self {
            attempt: 1,
            last_error: None,
        }
    }
}

/// Why a retry loop ended without a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<E> {
    /// A non-retryable error; returned unchanged, no further attempts
    Rejected(E),
    /// Every attempt failed with a retryable error
    Exhausted {
        /// Attempts made
        attempts: u32,
        /// Error from the final attempt
        last_error: E,
    },
    /// The cancellation token fired
    Cancelled {
        /// Attempts started before cancellation
        attempts: u32,
        /// Error from the last finished attempt, if any
        last_error: Option<E>,
    },
}

/// Retry an async operation while `is_retryable` says its error is transient.
///
/// `operation` receives the 1-based attempt number.
///
/// # Errors
///
/// - [`RetryOutcome::Rejected`] as soon as a non-retryable error occurs
/// - [`RetryOutcome::Exhausted`] after `max_attempts` retryable failures
/// - [`RetryOutcome::Cancelled`] if `cancel` fires first
pub async fn retry_with_predicate<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut operation: F,
    is_retryable: P,
) -> Result<T, RetryOutcome<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut state = RetryState::<E>::new();

    loop {
        tracing::debug!(attempt = state.attempt, max_attempts, "Starting attempt");

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!(attempt = state.attempt, "Cancelled during attempt");
                return Err(RetryOutcome::Cancelled {
                    attempts: state.attempt,
                    last_error: state.last_error,
                });
            }
            result = operation(state.attempt) => result,
        };

        let err = match result {
            Ok(value) => {
                if state.attempt > 1 {
                    tracing::info!(attempt = state.attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            },
            Err(err) => err,
        };

        if !is_retryable(&err) {
            tracing::warn!(
                attempt = state.attempt,
                error = %err,
                "Error is not retryable, failing immediately"
            );
            return Err(RetryOutcome::Rejected(err));
        }

        if state.attempt >= max_attempts {
            tracing::error!(
                attempt = state.attempt,
                error = %err,
                "Operation failed after max attempts"
            );
            return Err(RetryOutcome::Exhausted {
                attempts: state.attempt,
                last_error: err,
            });
        }

        let delay = policy.delay_after_attempt(state.attempt);
        tracing::warn!(
            attempt = state.attempt,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "Operation not ready, retrying"
        );
        state.last_error = Some(err);

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!(attempt = state.attempt, "Cancelled while waiting to retry");
                return Err(RetryOutcome::Cancelled {
                    attempts: state.attempt,
                    last_error: state.last_error,
                });
            }
            () = sleep(delay) => {}
        }

        state.attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::builder()
            .max_attempts(max_attempts)
            .delay(Duration::from_millis(10))
            .build()
    }

    #[test]
    fn test_payment_policy_is_fixed_delay() {
        let policy = RetryPolicy::payment_initialization();
        assert_eq!(policy.max_attempts, 10);
        for attempt in 1..10 {
            assert_eq!(policy.delay_after_attempt(attempt), Duration::from_millis(500));
        }
        assert_eq!(policy.total_delay_budget(), Duration::from_millis(4500));
    }

    #[test]
    fn test_growing_delay_is_capped() {
        let policy = RetryPolicy::builder()
            .delay(Duration::from_millis(100))
            .multiplier(2.0)
            .max_delay(Duration::from_millis(500))
            .build();

        assert_eq!(policy.delay_after_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after_attempt(3), Duration::from_millis(400));
        assert_eq!(policy.delay_after_attempt(4), Duration::from_millis(500));
    }

    #[test]
    fn test_shrinking_multiplier_gives_fixed_delay() {
        for multiplier in [-1.0, 0.0, 0.5, f64::NAN, f64::NEG_INFINITY] {
            let policy = RetryPolicy::builder()
                .delay(Duration::from_millis(100))
                .multiplier(multiplier)
                .build();
            assert!((policy.multiplier - 1.0).abs() < f64::EPSILON);
            assert_eq!(policy.delay_after_attempt(2), Duration::from_millis(100));
            assert_eq!(policy.delay_after_attempt(5), Duration::from_millis(100));
        }

        let assigned = RetryPolicy {
            multiplier: -2.0,
            ..RetryPolicy::payment_initialization()
        };
        assert_eq!(assigned.delay_after_attempt(2), Duration::from_millis(500));
        assert_eq!(assigned.delay_after_attempt(3), Duration::from_millis(500));
    }

    #[test]
    fn test_zero_attempts_is_raised_to_one() {
        assert_eq!(RetryPolicy::builder().max_attempts(0).build().max_attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_retryable_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let started = Instant::now();

        let result = retry_with_predicate(
            &fast_policy(5),
            &CancellationToken::new(),
            |attempt| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    if attempt < 3 { Err("not ready") } else { Ok(attempt) }
                }
            },
            |err: &&str| *err == "not ready",
        )
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_reports_last_error() {
        let result = retry_with_predicate(
            &fast_policy(3),
            &CancellationToken::new(),
            |attempt| async move { Err::<(), _>(format!("not ready #{attempt}")) },
            |_err: &String| true,
        )
        .await;

        assert_eq!(
            result,
            Err(RetryOutcome::Exhausted {
                attempts: 3,
                last_error: "not ready #3".to_string(),
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_stops_immediately() {
        let calls = Arc::new(AtomicU32::new(0));

        let result = retry_with_predicate(
            &fast_policy(10),
            &CancellationToken::new(),
            |_attempt| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>("forbidden")
                }
            },
            |err: &&str| *err == "not ready",
        )
        .await;

        assert_eq!(result, Err(RetryOutcome::Rejected("forbidden")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_delay_abandons_remaining_attempts() {
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));

        let canceller = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(15)).await;
            canceller.cancel();
        });

        let result = retry_with_predicate(
            &fast_policy(10),
            &cancel,
            |_attempt| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>("not ready")
                }
            },
            |_err: &&str| true,
        )
        .await;

        assert_eq!(
            result,
            Err(RetryOutcome::Cancelled {
                attempts: 2,
                last_error: Some("not ready"),
            })
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_already_cancelled_token_makes_no_attempt() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = Arc::new(AtomicU32::new(0));

        let result = retry_with_predicate(
            &fast_policy(3),
            &cancel,
            |_attempt| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(1)
                }
            },
            |_err: &String| true,
        )
        .await;

        assert!(matches!(result, Err(RetryOutcome::Cancelled { attempts: 1, last_error: None })));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
