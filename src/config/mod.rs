//! Poll configuration.
//!
//! [`PollConfig`] is the caller-facing builder: every field is optional and
//! falls back to a default. [`PollConfig::normalize`] resolves it into a
//! [`NormalizedConfig`] with no optional fields left, which is what the
//! scheduler runs on.
//!
//! | setting               | default                     |
//! |-----------------------|-----------------------------|
//! | mode                  | wait for completion         |
//! | delay                 | constant, 1000 ms           |
//! | retry                 | exponential, 1000 ms        |
//! | retry limit           | 3                           |
//! | consecutive only      | `true`                      |
//! | pause when inactive   | `true` ([`Activity::global`]) |
//!
//! Plain-data settings (string tags, raw numbers) live in [`PollSettings`].
//!
//! # Examples
//!
//! ```rust
//! use tidewater::{PollConfig, PollMode, RetryLimit, TimingStrategy};
//! use std::time::Duration;
//!
//! let config: PollConfig<String, std::io::Error> = PollConfig::new()
//!     .with_mode(PollMode::FixedCadence)
//!     .with_delay(TimingStrategy::constant(Duration::from_secs(30)))
//!     .with_retry(TimingStrategy::linear(Duration::from_secs(2)))
//!     .with_retry_limit(RetryLimit::Limited(5))
//!     .with_pause_when_inactive(false);
//!
//! let normalized = config.normalize();
//! assert_eq!(normalized.mode(), PollMode::FixedCadence);
//! assert_eq!(normalized.retry_limit(), RetryLimit::Limited(5));
//! ```

mod settings;

pub use settings::{PollSettings, RetrySettings, StrategySettings, TimeSetting};

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tokio::sync::watch;

use crate::activity::{Activity, ActivitySignal};
use crate::error::ConfigError;
use crate::retry::{RetryGovernor, RetryLimit};
use crate::timing::{evaluate, TimeProducer, TimingMode, TimingStrategy};

/// Fallback delay between cycles, in milliseconds.
pub const DEFAULT_DELAY_MS: f64 = 1000.0;
/// Fallback retry wait, in milliseconds.
pub const DEFAULT_RETRY_MS: f64 = 1000.0;
/// Default retry limit.
pub const DEFAULT_RETRY_LIMIT: u32 = 3;

/// Polling discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum PollMode {
    /// The next wait starts once the current cycle has finished.
    #[default]
    WaitForCompletion,
    /// Cycles start on a clock; a cycle still running when the next one is
    /// due gets dropped.
    FixedCadence,
}

impl PollMode {
    /// Settings tag of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WaitForCompletion => "wait-for-completion",
            Self::FixedCadence => "fixed-cadence",
        }
    }
}

impl fmt::Display for PollMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PollMode {
    type Err = ConfigError;

    /// Accepts `wait-for-completion`/`repeat` and `fixed-cadence`/`interval`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wait-for-completion" | "repeat" => Ok(Self::WaitForCompletion),
            "fixed-cadence" | "interval" => Ok(Self::FixedCadence),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

/// Caller-facing poll configuration. Every field is optional.
pub struct PollConfig<T, E> {
    mode: Option<PollMode>,
    delay: Option<TimingStrategy<T, E>>,
    retry: Option<TimingStrategy<T, E>>,
    retry_limit: Option<RetryLimit>,
    consecutive_only: Option<bool>,
    pause_when_inactive: Option<bool>,
    activity: Option<watch::Receiver<bool>>,
}

impl<T, E> PollConfig<T, E> {
    /// A configuration using every default.
    pub fn new() -> Self {
        Self {
            mode: None,
            delay: None,
            retry: None,
            retry_limit: None,
            consecutive_only: None,
            pause_when_inactive: None,
            activity: None,
        }
    }

    /// Set the polling discipline.
    pub fn with_mode(mut self, mode: PollMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Set the wait between successful cycles.
    pub fn with_delay(mut self, strategy: TimingStrategy<T, E>) -> Self {
        self.delay = Some(strategy);
        self
    }

    /// Set the wait before retrying a failed cycle.
    pub fn with_retry(mut self, strategy: TimingStrategy<T, E>) -> Self {
        self.retry = Some(strategy);
        self
    }

    /// Set how many counted retries are tolerated.
    pub fn with_retry_limit(mut self, limit: impl Into<RetryLimit>) -> Self {
        self.retry_limit = Some(limit.into());
        self
    }

    /// Count only retries since the last success towards the limit.
    pub fn with_consecutive_only(mut self, consecutive_only: bool) -> Self {
        self.consecutive_only = Some(consecutive_only);
        self
    }

    /// Pause scheduling while the activity signal is inactive.
    pub fn with_pause_when_inactive(mut self, pause: bool) -> Self {
        self.pause_when_inactive = Some(pause);
        self
    }

    /// Follow `signal` instead of [`Activity::global`].
    ///
    /// Only consulted while pausing is enabled.
    pub fn with_activity(mut self, signal: impl ActivitySignal) -> Self {
        self.activity = Some(signal.subscribe());
        self
    }

    /// Resolve every default and normalize the configured numbers.
    pub fn normalize(self) -> NormalizedConfig<T, E> {
        let pause_when_inactive = self.pause_when_inactive.unwrap_or(true);
        let activity = if pause_when_inactive {
            Some(
                self.activity
                    .unwrap_or_else(|| Activity::global().subscribe()),
            )
        } else {
            None
        };

        NormalizedConfig {
            mode: self.mode.unwrap_or_default(),
            delay: self
                .delay
                .unwrap_or(TimingStrategy::Constant(DEFAULT_DELAY_MS))
                .normalized(DEFAULT_DELAY_MS),
            retry: self
                .retry
                .unwrap_or(TimingStrategy::Exponential(DEFAULT_RETRY_MS))
                .normalized(DEFAULT_RETRY_MS),
            retry_limit: self.retry_limit.unwrap_or_default(),
            consecutive_only: self.consecutive_only.unwrap_or(true),
            pause_when_inactive,
            activity,
        }
    }
}

impl<T, E> Default for PollConfig<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for PollConfig<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollConfig")
            .field("mode", &self.mode)
            .field("delay", &self.delay)
            .field("retry", &self.retry)
            .field("retry_limit", &self.retry_limit)
            .field("consecutive_only", &self.consecutive_only)
            .field("pause_when_inactive", &self.pause_when_inactive)
            .field("activity", &self.activity.is_some())
            .finish()
    }
}

/// Fully resolved configuration. Immutable once built.
pub struct NormalizedConfig<T, E> {
    mode: PollMode,
    delay: TimingStrategy<T, E>,
    retry: TimingStrategy<T, E>,
    retry_limit: RetryLimit,
    consecutive_only: bool,
    pause_when_inactive: bool,
    activity: Option<watch::Receiver<bool>>,
}

impl<T, E> NormalizedConfig<T, E> {
    /// Polling discipline.
    pub fn mode(&self) -> PollMode {
        self.mode
    }

    /// Wait between successful cycles.
    pub fn delay(&self) -> &TimingStrategy<T, E> {
        &self.delay
    }

    /// Wait before a retry.
    pub fn retry(&self) -> &TimingStrategy<T, E> {
        &self.retry
    }

    /// Retry limit.
    pub fn retry_limit(&self) -> RetryLimit {
        self.retry_limit
    }

    /// Whether only consecutive retries count towards the limit.
    pub fn consecutive_only(&self) -> bool {
        self.consecutive_only
    }

    /// Whether scheduling pauses while inactive.
    pub fn pause_when_inactive(&self) -> bool {
        self.pause_when_inactive
    }

    /// Time producer for the delay between cycles.
    pub fn delay_producer(&self) -> TimeProducer<T, E> {
        evaluate(
            TimingMode::Delay,
            self.delay.clone(),
            Duration::from_millis(DEFAULT_DELAY_MS as u64),
        )
    }

    /// Retry governor for this configuration.
    pub fn retry_governor(&self) -> RetryGovernor<T, E> {
        RetryGovernor::new(
            self.retry_limit,
            self.consecutive_only,
            evaluate(
                TimingMode::Retry {
                    consecutive_only: self.consecutive_only,
                },
                self.retry.clone(),
                Duration::from_millis(DEFAULT_RETRY_MS as u64),
            ),
        )
    }

    /// Listener the visibility gate follows; `None` when pausing is off.
    pub(crate) fn activity(&self) -> Option<watch::Receiver<bool>> {
        self.activity.clone()
    }
}

impl<T, E> fmt::Debug for NormalizedConfig<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizedConfig")
            .field("mode", &self.mode)
            .field("delay", &self.delay)
            .field("retry", &self.retry)
            .field("retry_limit", &self.retry_limit)
            .field("consecutive_only", &self.consecutive_only)
            .field("pause_when_inactive", &self.pause_when_inactive)
            .finish()
    }
}
