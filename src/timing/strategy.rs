//! Timing strategy types and their evaluation.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use super::normalize::{duration_to_millis, millis_to_duration, normalize_millis, sample_millis};
use crate::error::ConfigError;
use crate::state::PollState;

/// Callback used by [`TimingStrategy::Dynamic`].
///
/// It only ever receives a shared borrow of the session state.
pub type DynamicTime<T, E> = Arc<dyn Fn(&PollState<T, E>) -> WaitTime + Send + Sync>;

/// How long to wait before the next cycle.
///
/// Times are milliseconds held as `f64` so that a misbehaving value (negative,
/// NaN, infinite) can be normalized instead of rejected.
///
/// # Examples
///
/// ```rust
/// use tidewater::TimingStrategy;
/// use std::time::Duration;
///
/// let delay = TimingStrategy::<u32, String>::constant(Duration::from_secs(5));
/// let retry = TimingStrategy::<u32, String>::exponential(Duration::from_millis(500));
/// let jittered = TimingStrategy::<u32, String>::random(
///     Duration::from_millis(800),
///     Duration::from_millis(1200),
/// );
///
/// // Back off harder while the last cycle failed.
/// let adaptive = TimingStrategy::<u32, String>::dynamic(|state| {
///     if state.error().is_some() { 10_000.0 } else { 1_000.0 }
/// });
/// # let _ = (delay, retry, jittered, adaptive);
/// ```
pub enum TimingStrategy<T, E> {
    /// Always the same wait.
    Constant(f64),
    /// `attempt * time`.
    Linear(f64),
    /// `2^(attempt - 1) * time`, attempt counted from 1.
    Exponential(f64),
    /// Uniform whole milliseconds between the two bounds.
    Random(f64, f64),
    /// Computed from the session state by a caller supplied function.
    Dynamic(DynamicTime<T, E>),
}

/// Result of a [`TimingStrategy::Dynamic`] callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaitTime {
    /// Wait exactly this many milliseconds.
    Millis(f64),
    /// Wait a random whole number of milliseconds in `[min, max]`.
    Range(f64, f64),
    /// No opinion; the default wait is used.
    Unset,
}

/// Tag naming a timing strategy, as used in plain settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StrategyKind {
    /// See [`TimingStrategy::Constant`].
    Constant,
    /// See [`TimingStrategy::Linear`].
    Linear,
    /// See [`TimingStrategy::Exponential`].
    Exponential,
    /// See [`TimingStrategy::Random`].
    Random,
    /// See [`TimingStrategy::Dynamic`].
    Dynamic,
}

/// Which counter drives linear and exponential growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingMode {
    /// Pacing between successful cycles; driven by `poll_count`.
    Delay,
    /// Waiting before a retry; driven by `consecutive_retry_count` when
    /// `consecutive_only`, otherwise by `retry_count`.
    Retry {
        /// Count only retries since the last success.
        consecutive_only: bool,
    },
}

/// A strategy bound to a [`TimingMode`] and a fallback wait.
///
/// Produced by [`evaluate`]; every value it hands out is normalized, so it is
/// never negative and never infinite.
pub struct TimeProducer<T, E> {
    strategy: TimingStrategy<T, E>,
    mode: TimingMode,
    default_ms: f64,
}

/// Bind `strategy` to `mode`, falling back to `default` whenever the strategy
/// produces something unusable.
///
/// # Examples
///
/// ```rust
/// use tidewater::timing::{evaluate, TimingMode};
/// use tidewater::{PollState, TimingStrategy};
/// use std::time::Duration;
///
/// let producer = evaluate(
///     TimingMode::Delay,
///     TimingStrategy::<u32, String>::constant(Duration::from_millis(250)),
///     Duration::from_secs(1),
/// );
///
/// assert_eq!(producer.wait(&PollState::new()), Duration::from_millis(250));
/// ```
pub fn evaluate<T, E>(
    mode: TimingMode,
    strategy: TimingStrategy<T, E>,
    default: Duration,
) -> TimeProducer<T, E> {
    TimeProducer {
        strategy,
        mode,
        default_ms: duration_to_millis(default),
    }
}

impl<T, E> TimingStrategy<T, E> {
    /// Fixed wait.
    pub fn constant(time: Duration) -> Self {
        Self::Constant(duration_to_millis(time))
    }

    /// Wait growing by `step` per attempt.
    pub fn linear(step: Duration) -> Self {
        Self::Linear(duration_to_millis(step))
    }

    /// Wait doubling per attempt, starting at `base`.
    pub fn exponential(base: Duration) -> Self {
        Self::Exponential(duration_to_millis(base))
    }

    /// Random wait between `min` and `max` (either order).
    pub fn random(min: Duration, max: Duration) -> Self {
        Self::Random(duration_to_millis(min), duration_to_millis(max))
    }

    /// Wait computed from the session state.
    ///
    /// The callback may return anything convertible into [`WaitTime`]:
    /// milliseconds as a number, a `(min, max)` pair, a [`Duration`] or an
    /// `Option` of milliseconds.
    pub fn dynamic<F, W>(f: F) -> Self
    where
        F: Fn(&PollState<T, E>) -> W + Send + Sync + 'static,
        W: Into<WaitTime>,
    {
        Self::Dynamic(Arc::new(move |state| f(state).into()))
    }

    /// Tag of this strategy.
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Constant(_) => StrategyKind::Constant,
            Self::Linear(_) => StrategyKind::Linear,
            Self::Exponential(_) => StrategyKind::Exponential,
            Self::Random(_, _) => StrategyKind::Random,
            Self::Dynamic(_) => StrategyKind::Dynamic,
        }
    }

    /// Normalize the configured numbers, leaving callbacks untouched.
    pub(crate) fn normalized(self, default_ms: f64) -> Self {
        match self {
            Self::Constant(t) => Self::Constant(normalize_millis(Some(t), default_ms)),
            Self::Linear(t) => Self::Linear(normalize_millis(Some(t), default_ms)),
            Self::Exponential(t) => Self::Exponential(normalize_millis(Some(t), default_ms)),
            Self::Random(min, max) => Self::Random(
                normalize_millis(Some(min), default_ms),
                normalize_millis(Some(max), default_ms),
            ),
            Self::Dynamic(f) => Self::Dynamic(f),
        }
    }
}

impl<T, E> Clone for TimingStrategy<T, E> {
    fn clone(&self) -> Self {
        match self {
            Self::Constant(t) => Self::Constant(*t),
            Self::Linear(t) => Self::Linear(*t),
            Self::Exponential(t) => Self::Exponential(*t),
            Self::Random(min, max) => Self::Random(*min, *max),
            Self::Dynamic(f) => Self::Dynamic(Arc::clone(f)),
        }
    }
}

impl<T, E> fmt::Debug for TimingStrategy<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(t) => f.debug_tuple("Constant").field(t).finish(),
            Self::Linear(t) => f.debug_tuple("Linear").field(t).finish(),
            Self::Exponential(t) => f.debug_tuple("Exponential").field(t).finish(),
            Self::Random(min, max) => f.debug_tuple("Random").field(min).field(max).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl TimingMode {
    /// The attempt number this mode reads from `state`.
    pub fn attempt<T, E>(&self, state: &PollState<T, E>) -> u32 {
        match self {
            Self::Delay => state.poll_count(),
            Self::Retry {
                consecutive_only: true,
            } => state.consecutive_retry_count(),
            Self::Retry {
                consecutive_only: false,
            } => state.retry_count(),
        }
    }
}

impl<T, E> TimeProducer<T, E> {
    /// Normalized wait in milliseconds for the given state.
    pub fn millis(&self, state: &PollState<T, E>) -> f64 {
        let attempt = f64::from(self.mode.attempt(state));

        let raw = match &self.strategy {
            TimingStrategy::Constant(t) => WaitTime::Millis(*t),
            TimingStrategy::Linear(t) => WaitTime::Millis(attempt * t),
            // Attempt 0 is treated as attempt 1 so the first wait is `t`.
            TimingStrategy::Exponential(t) => {
                WaitTime::Millis(2f64.powf(attempt.max(1.0) - 1.0) * t)
            }
            TimingStrategy::Random(min, max) => WaitTime::Range(*min, *max),
            TimingStrategy::Dynamic(f) => f(state),
        };

        match raw {
            WaitTime::Millis(ms) => normalize_millis(Some(ms), self.default_ms),
            WaitTime::Range(min, max) => sample_millis(
                normalize_millis(Some(min), self.default_ms),
                normalize_millis(Some(max), self.default_ms),
            ),
            WaitTime::Unset => self.default_ms,
        }
    }

    /// Normalized wait for the given state.
    pub fn wait(&self, state: &PollState<T, E>) -> Duration {
        millis_to_duration(self.millis(state))
    }

    /// The counter selection this producer uses.
    pub fn mode(&self) -> TimingMode {
        self.mode
    }

    /// The strategy this producer evaluates.
    pub fn strategy(&self) -> &TimingStrategy<T, E> {
        &self.strategy
    }
}

impl<T, E> fmt::Debug for TimeProducer<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeProducer")
            .field("strategy", &self.strategy)
            .field("mode", &self.mode)
            .field("default_ms", &self.default_ms)
            .finish()
    }
}

impl StrategyKind {
    /// Settings tag of this strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Linear => "linear",
            Self::Exponential => "exponential",
            Self::Random => "random",
            Self::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "constant" => Ok(Self::Constant),
            "linear" => Ok(Self::Linear),
            "exponential" => Ok(Self::Exponential),
            "random" => Ok(Self::Random),
            "dynamic" => Ok(Self::Dynamic),
            other => Err(ConfigError::UnknownStrategy(other.to_string())),
        }
    }
}

impl From<f64> for WaitTime {
    fn from(ms: f64) -> Self {
        Self::Millis(ms)
    }
}

impl From<i32> for WaitTime {
    fn from(ms: i32) -> Self {
        Self::Millis(f64::from(ms))
    }
}

impl From<u32> for WaitTime {
    fn from(ms: u32) -> Self {
        Self::Millis(f64::from(ms))
    }
}

impl From<u64> for WaitTime {
    fn from(ms: u64) -> Self {
        Self::Millis(ms as f64)
    }
}

impl From<Duration> for WaitTime {
    fn from(d: Duration) -> Self {
        Self::Millis(duration_to_millis(d))
    }
}

impl From<(f64, f64)> for WaitTime {
    fn from((min, max): (f64, f64)) -> Self {
        Self::Range(min, max)
    }
}

impl From<(i32, i32)> for WaitTime {
    fn from((min, max): (i32, i32)) -> Self {
        Self::Range(f64::from(min), f64::from(max))
    }
}

impl From<(Duration, Duration)> for WaitTime {
    fn from((min, max): (Duration, Duration)) -> Self {
        Self::Range(duration_to_millis(min), duration_to_millis(max))
    }
}

impl From<[f64; 2]> for WaitTime {
    fn from([min, max]: [f64; 2]) -> Self {
        Self::Range(min, max)
    }
}

impl<W: Into<WaitTime>> From<Option<W>> for WaitTime {
    fn from(value: Option<W>) -> Self {
        value.map_or(Self::Unset, Into::into)
    }
}
