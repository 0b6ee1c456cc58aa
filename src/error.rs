//! Configuration errors.
//!
//! These are programmer errors: they surface synchronously while a
//! configuration is being built and are never retried. Failures of the polled
//! source itself are the caller's own error type and end up in
//! [`RetryLimitExceeded`](crate::RetryLimitExceeded) once retries run out.

use std::fmt;

/// Error raised while turning caller input into a poll configuration.
///
/// # Examples
///
/// ```rust
/// use tidewater::{ConfigError, StrategyKind};
///
/// let err = "fibonacci".parse::<StrategyKind>().unwrap_err();
/// assert_eq!(err, ConfigError::UnknownStrategy("fibonacci".to_string()));
/// assert!(err.to_string().contains("fibonacci"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The strategy tag is not one of the known timing strategies.
    UnknownStrategy(String),
    /// The polling mode tag is not recognized.
    UnknownMode(String),
    /// The `time` value does not fit the selected strategy, e.g. a
    /// `[min, max]` range for `linear`.
    MismatchedTime {
        /// Strategy tag the time was given for.
        strategy: &'static str,
        /// Shape the strategy expects.
        expected: &'static str,
    },
    /// A `random` strategy was configured without a `[min, max]` range.
    MissingRange,
    /// `dynamic` needs a callback and cannot be built from plain settings.
    DynamicWithoutCallback,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownStrategy(tag) => write!(f, "unknown timing strategy: {tag:?}"),
            Self::UnknownMode(tag) => write!(f, "unknown polling mode: {tag:?}"),
            Self::MismatchedTime { strategy, expected } => {
                write!(f, "strategy {strategy:?} expects {expected} as its time")
            }
            Self::MissingRange => write!(f, "strategy \"random\" requires a [min, max] time"),
            Self::DynamicWithoutCallback => {
                write!(f, "strategy \"dynamic\" requires a callback, not plain settings")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_offending_tag() {
        let err = ConfigError::UnknownMode("sometimes".to_string());
        assert_eq!(err.to_string(), "unknown polling mode: \"sometimes\"");
    }

    #[test]
    fn test_display_mismatched_time() {
        let err = ConfigError::MismatchedTime {
            strategy: "linear",
            expected: "a single number",
        };
        assert_eq!(
            err.to_string(),
            "strategy \"linear\" expects a single number as its time"
        );
    }
}
