//! Plain-data poll settings.
//!
//! [`PollSettings`] mirrors [`PollConfig`] with string tags and raw numbers,
//! the shape a configuration file or another process would hand over. With
//! the `serde` feature it deserializes from camelCase keys:
//!
//! ```json
//! {
//!   "type": "interval",
//!   "delay": { "strategy": "constant", "time": 30000 },
//!   "retry": { "time": [500, 1500], "limit": 5, "consecutiveOnly": false },
//!   "pauseWhenInactive": false
//! }
//! ```
//!
//! A `time` given as `[min, max]` without a `strategy` selects `random`.

use super::{PollConfig, PollMode, DEFAULT_DELAY_MS, DEFAULT_RETRY_LIMIT, DEFAULT_RETRY_MS};
use crate::error::ConfigError;
use crate::retry::RetryLimit;
use crate::timing::{StrategyKind, TimingStrategy};

/// A time value: milliseconds or a `[min, max]` range.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum TimeSetting {
    /// A single wait in milliseconds.
    Millis(f64),
    /// Bounds for a random wait, in milliseconds.
    Range(f64, f64),
}

/// Strategy tag plus time.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct StrategySettings {
    /// Strategy tag, e.g. `"linear"`.
    pub strategy: Option<String>,
    /// Time for the strategy.
    pub time: Option<TimeSetting>,
}

/// Retry strategy, limit and counting rule.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct RetrySettings {
    /// Strategy tag, e.g. `"exponential"`.
    pub strategy: Option<String>,
    /// Time for the strategy.
    pub time: Option<TimeSetting>,
    /// Retry limit; see [`RetryLimit::from_f64`].
    pub limit: Option<f64>,
    /// Count only retries since the last success.
    pub consecutive_only: Option<bool>,
}

/// Plain-data counterpart of [`PollConfig`].
///
/// # Examples
///
/// ```rust
/// use tidewater::config::{PollSettings, RetrySettings, TimeSetting};
/// use tidewater::{PollMode, RetryLimit};
///
/// let settings = PollSettings {
///     mode: Some("repeat".to_string()),
///     retry: Some(RetrySettings {
///         time: Some(TimeSetting::Range(500.0, 1500.0)),
///         limit: Some(-2.0),
///         ..Default::default()
///     }),
///     ..Default::default()
/// };
///
/// let config = settings.into_config::<u32, String>().unwrap().normalize();
/// assert_eq!(config.mode(), PollMode::WaitForCompletion);
/// assert_eq!(config.retry_limit(), RetryLimit::Limited(2));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct PollSettings {
    /// Mode tag: `wait-for-completion`/`repeat` or `fixed-cadence`/`interval`.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub mode: Option<String>,
    /// Delay between successful cycles.
    pub delay: Option<StrategySettings>,
    /// Retry behavior.
    pub retry: Option<RetrySettings>,
    /// Pause scheduling while the process-wide activity signal is inactive.
    pub pause_when_inactive: Option<bool>,
}

impl PollSettings {
    /// Validate the tags and build a [`PollConfig`].
    ///
    /// Missing values keep their defaults. Numbers are normalized later by
    /// [`PollConfig::normalize`].
    pub fn into_config<T, E>(self) -> Result<PollConfig<T, E>, ConfigError> {
        let mut config = PollConfig::new();

        if let Some(tag) = self.mode {
            config = config.with_mode(tag.parse::<PollMode>()?);
        }

        if let Some(delay) = self.delay {
            config = config.with_delay(build_strategy(
                delay.strategy.as_deref(),
                delay.time,
                StrategyKind::Constant,
                DEFAULT_DELAY_MS,
            )?);
        }

        if let Some(retry) = self.retry {
            config = config.with_retry(build_strategy(
                retry.strategy.as_deref(),
                retry.time,
                StrategyKind::Exponential,
                DEFAULT_RETRY_MS,
            )?);
            if let Some(limit) = retry.limit {
                config = config.with_retry_limit(RetryLimit::from_f64(limit, DEFAULT_RETRY_LIMIT));
            }
            if let Some(consecutive_only) = retry.consecutive_only {
                config = config.with_consecutive_only(consecutive_only);
            }
        }

        if let Some(pause) = self.pause_when_inactive {
            config = config.with_pause_when_inactive(pause);
        }

        Ok(config)
    }
}

fn build_strategy<T, E>(
    tag: Option<&str>,
    time: Option<TimeSetting>,
    fallback: StrategyKind,
    default_ms: f64,
) -> Result<TimingStrategy<T, E>, ConfigError> {
    let kind = match (tag, time) {
        (Some(tag), _) => tag.parse::<StrategyKind>()?,
        (None, Some(TimeSetting::Range(_, _))) => StrategyKind::Random,
        (None, _) => fallback,
    };

    match (kind, time) {
        (StrategyKind::Dynamic, _) => Err(ConfigError::DynamicWithoutCallback),
        (StrategyKind::Random, Some(TimeSetting::Range(min, max))) => {
            Ok(TimingStrategy::Random(min, max))
        }
        (StrategyKind::Random, _) => Err(ConfigError::MissingRange),
        (kind, Some(TimeSetting::Range(_, _))) => Err(ConfigError::MismatchedTime {
            strategy: kind.as_str(),
            expected: "a single number",
        }),
        (kind, time) => {
            let ms = match time {
                Some(TimeSetting::Millis(ms)) => ms,
                _ => default_ms,
            };
            Ok(match kind {
                StrategyKind::Linear => TimingStrategy::Linear(ms),
                StrategyKind::Exponential => TimingStrategy::Exponential(ms),
                _ => TimingStrategy::Constant(ms),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Config = PollConfig<u32, &'static str>;

    fn delay(strategy: Option<&str>, time: Option<TimeSetting>) -> PollSettings {
        PollSettings {
            delay: Some(StrategySettings {
                strategy: strategy.map(str::to_string),
                time,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_settings_keep_defaults() {
        let config: Config = PollSettings::default().into_config().unwrap();
        let config = config.normalize();

        assert_eq!(config.mode(), PollMode::WaitForCompletion);
        assert_eq!(config.retry_limit(), RetryLimit::Limited(3));
        assert!(config.consecutive_only());
    }

    #[test]
    fn test_mode_aliases() {
        let settings = PollSettings {
            mode: Some("interval".to_string()),
            ..Default::default()
        };
        let config: Config = settings.into_config().unwrap();

        assert_eq!(config.normalize().mode(), PollMode::FixedCadence);
    }

    #[test]
    fn test_unknown_tags_are_rejected() {
        let mode = PollSettings {
            mode: Some("eventually".to_string()),
            ..Default::default()
        };
        assert_eq!(
            mode.into_config::<u32, &str>().unwrap_err(),
            ConfigError::UnknownMode("eventually".to_string())
        );

        assert_eq!(
            delay(Some("fibonacci"), None)
                .into_config::<u32, &str>()
                .unwrap_err(),
            ConfigError::UnknownStrategy("fibonacci".to_string())
        );
    }

    #[test]
    fn test_range_without_tag_is_random() {
        let config: Config = delay(None, Some(TimeSetting::Range(10.0, 20.0)))
            .into_config()
            .unwrap();

        assert!(matches!(
            config.normalize().delay(),
            TimingStrategy::Random(min, max) if *min == 10.0 && *max == 20.0
        ));
    }

    #[test]
    fn test_shape_mismatches() {
        assert_eq!(
            delay(Some("linear"), Some(TimeSetting::Range(1.0, 2.0)))
                .into_config::<u32, &str>()
                .unwrap_err(),
            ConfigError::MismatchedTime {
                strategy: "linear",
                expected: "a single number",
            }
        );
        assert_eq!(
            delay(Some("random"), Some(TimeSetting::Millis(5.0)))
                .into_config::<u32, &str>()
                .unwrap_err(),
            ConfigError::MissingRange
        );
        assert_eq!(
            delay(Some("dynamic"), None)
                .into_config::<u32, &str>()
                .unwrap_err(),
            ConfigError::DynamicWithoutCallback
        );
    }

    #[test]
    fn test_retry_settings() {
        let settings = PollSettings {
            retry: Some(RetrySettings {
                strategy: Some("linear".to_string()),
                time: Some(TimeSetting::Millis(-250.0)),
                limit: Some(f64::INFINITY),
                consecutive_only: Some(false),
            }),
            ..Default::default()
        };
        let config: Config = settings.into_config().unwrap();
        let config = config.normalize();

        assert!(matches!(config.retry(), TimingStrategy::Linear(t) if *t == 250.0));
        assert_eq!(config.retry_limit(), RetryLimit::Unlimited);
        assert!(!config.consecutive_only());
    }

    #[test]
    fn test_missing_time_uses_default() {
        let config: Config = delay(Some("exponential"), None).into_config().unwrap();

        assert!(matches!(
            config.normalize().delay(),
            TimingStrategy::Exponential(t) if *t == 1000.0
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_camel_case() {
        let settings: PollSettings = serde_json::from_str(
            r#"{
                "type": "fixed-cadence",
                "delay": { "strategy": "constant", "time": 30000 },
                "retry": { "time": [500, 1500], "limit": 5, "consecutiveOnly": false },
                "pauseWhenInactive": false
            }"#,
        )
        .unwrap();

        assert_eq!(settings.mode.as_deref(), Some("fixed-cadence"));
        assert_eq!(settings.pause_when_inactive, Some(false));
        assert_eq!(
            settings.retry.as_ref().and_then(|r| r.time),
            Some(TimeSetting::Range(500.0, 1500.0))
        );

        let config = settings.into_config::<u32, String>().unwrap().normalize();
        assert_eq!(config.mode(), PollMode::FixedCadence);
        assert_eq!(config.retry_limit(), RetryLimit::Limited(5));
        assert!(!config.pause_when_inactive());
    }
}
