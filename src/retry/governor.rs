//! Retry-or-fail decisions for failed cycles.

use std::time::Duration;

use super::error::RetryLimitExceeded;
use crate::state::PollState;
use crate::timing::TimeProducer;

/// Upper bound on retries before a poll session fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum RetryLimit {
    /// Fail once the counted retries exceed this number. `Limited(0)` fails
    /// on the very first error.
    Limited(u32),
    /// Never give up.
    Unlimited,
}

impl RetryLimit {
    /// Build a limit from a raw number.
    ///
    /// NaN falls back to `default`, negative values are mirrored, infinity
    /// means [`RetryLimit::Unlimited`] and fractions are floored.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tidewater::RetryLimit;
    ///
    /// assert_eq!(RetryLimit::from_f64(5.0, 3), RetryLimit::Limited(5));
    /// assert_eq!(RetryLimit::from_f64(-2.7, 3), RetryLimit::Limited(2));
    /// assert_eq!(RetryLimit::from_f64(f64::NAN, 3), RetryLimit::Limited(3));
    /// assert_eq!(RetryLimit::from_f64(f64::INFINITY, 3), RetryLimit::Unlimited);
    /// ```
    pub fn from_f64(value: f64, default: u32) -> Self {
        if value.is_nan() {
            return Self::Limited(default);
        }
        let value = value.abs();
        if value.is_infinite() || value > f64::from(u32::MAX) {
            Self::Unlimited
        } else {
            Self::Limited(value.floor() as u32)
        }
    }

    /// Whether `attempts` counted retries go past this limit.
    pub fn is_exceeded_by(&self, attempts: u32) -> bool {
        match self {
            Self::Limited(limit) => attempts > *limit,
            Self::Unlimited => false,
        }
    }
}

impl Default for RetryLimit {
    fn default() -> Self {
        Self::Limited(3)
    }
}

impl From<u32> for RetryLimit {
    fn from(limit: u32) -> Self {
        Self::Limited(limit)
    }
}

/// Outcome of handing a failure to the [`RetryGovernor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision<E> {
    /// Wait this long, then run the cycle again.
    Retry(Duration),
    /// The limit is exceeded; the session ends with this error.
    GiveUp(RetryLimitExceeded<E>),
}

/// Decides what happens after a cycle fails and keeps the retry counters.
///
/// # Examples
///
/// ```rust
/// use tidewater::timing::{evaluate, TimingMode};
/// use tidewater::{PollState, RetryDecision, RetryGovernor, RetryLimit, TimingStrategy};
/// use std::time::Duration;
///
/// let governor = RetryGovernor::new(
///     RetryLimit::Limited(1),
///     true,
///     evaluate(
///         TimingMode::Retry { consecutive_only: true },
///         TimingStrategy::<u32, &str>::exponential(Duration::from_millis(100)),
///         Duration::from_secs(1),
///     ),
/// );
/// let mut state = PollState::new();
///
/// assert_eq!(
///     governor.on_failure(&mut state, "timeout"),
///     RetryDecision::Retry(Duration::from_millis(100)),
/// );
/// assert!(matches!(
///     governor.on_failure(&mut state, "timeout"),
///     RetryDecision::GiveUp(_),
/// ));
/// ```
#[derive(Debug)]
pub struct RetryGovernor<T, E> {
    limit: RetryLimit,
    consecutive_only: bool,
    wait: TimeProducer<T, E>,
}

impl<T, E> RetryGovernor<T, E> {
    /// Create a governor counting against `limit`.
    ///
    /// With `consecutive_only` only retries since the last success count
    /// towards the limit; otherwise every retry of the session does.
    pub fn new(limit: RetryLimit, consecutive_only: bool, wait: TimeProducer<T, E>) -> Self {
        Self {
            limit,
            consecutive_only,
            wait,
        }
    }

    /// Record a failed cycle and decide whether to retry.
    ///
    /// The limit is checked before any wait is computed, so a limit of zero
    /// gives up immediately.
    pub fn on_failure(&self, state: &mut PollState<T, E>, error: E) -> RetryDecision<E> {
        state.increment_retry();

        let attempts = if self.consecutive_only {
            state.consecutive_retry_count()
        } else {
            state.retry_count()
        };

        if self.limit.is_exceeded_by(attempts) {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                retry_count = state.retry_count(),
                consecutive_retry_count = state.consecutive_retry_count(),
                "poll retry limit exceeded"
            );
            return RetryDecision::GiveUp(RetryLimitExceeded::new(
                error,
                state.retry_count(),
                state.consecutive_retry_count(),
                state.poll_count(),
            ));
        }

        state.set_error(error);
        let wait = self.wait.wait(state);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            attempt = attempts,
            wait_ms = wait.as_millis() as u64,
            "poll cycle failed, retrying"
        );

        RetryDecision::Retry(wait)
    }

    /// Record a successful cycle: clear the error and the consecutive count.
    pub fn on_success(&self, state: &mut PollState<T, E>) {
        state.reset_error();
    }

    /// The configured limit.
    pub fn limit(&self) -> RetryLimit {
        self.limit
    }

    /// Whether only consecutive retries count towards the limit.
    pub fn consecutive_only(&self) -> bool {
        self.consecutive_only
    }
}
