//! Terminal error of a poll session.

/// Error yielded once a poll session has used up its retries.
///
/// This is the only way a poll stream ends on its own: the stream yields
/// `Err(RetryLimitExceeded)` and then finishes. It carries the failure that
/// tipped it over plus the session counters at that moment.
///
/// # Examples
///
/// ```rust
/// use tidewater::{poll_future, PollConfig, RetryLimit, RetryLimitExceeded};
/// use futures::StreamExt;
///
/// # tokio_test::block_on(async {
/// let config = PollConfig::new().with_retry_limit(RetryLimit::Limited(0));
/// let mut polls = poll_future(|| async { Err::<u32, _>("offline") }, config);
///
/// match polls.next().await {
///     Some(Err(exceeded)) => {
///         assert_eq!(exceeded.final_error, "offline");
///         assert_eq!(exceeded.retry_count, 1);
///     }
///     other => panic!("Expected terminal failure, got {other:?}"),
/// }
/// assert!(polls.next().await.is_none());
/// # });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryLimitExceeded<E> {
    /// The failure that exceeded the limit.
    pub final_error: E,
    /// Retry attempts over the whole session, including the failing one.
    pub retry_count: u32,
    /// Retry attempts since the last success, including the failing one.
    pub consecutive_retry_count: u32,
    /// Cycles completed before the session ended.
    pub poll_count: u32,
}

impl<E> RetryLimitExceeded<E> {
    /// Create a new terminal error.
    pub fn new(
        final_error: E,
        retry_count: u32,
        consecutive_retry_count: u32,
        poll_count: u32,
    ) -> Self {
        Self {
            final_error,
            retry_count,
            consecutive_retry_count,
            poll_count,
        }
    }

    /// Extract the final error, discarding the counters.
    pub fn into_error(self) -> E {
        self.final_error
    }

    /// Get a reference to the final error.
    pub fn error(&self) -> &E {
        &self.final_error
    }
}

impl<E: std::fmt::Display> std::fmt::Display for RetryLimitExceeded<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "retry limit exceeded after {} retries ({} consecutive, {} polls): {}",
            self.retry_count, self.consecutive_retry_count, self.poll_count, self.final_error
        )
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryLimitExceeded<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.final_error)
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;
    use std::error::Error;
    use std::fmt;

    #[derive(Debug)]
    struct Offline;

    impl fmt::Display for Offline {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("offline")
        }
    }

    impl Error for Offline {}

    #[test]
    fn test_retry_limit_exceeded_display() {
        let err = RetryLimitExceeded::new("connection failed", 4, 4, 2);
        let display = format!("{}", err);
        assert!(display.contains("retry limit exceeded"));
        assert!(display.contains("4 retries"));
        assert!(display.contains("connection failed"));
    }

    #[test]
    fn test_retry_limit_exceeded_into_error() {
        let err = RetryLimitExceeded::new("test error", 1, 1, 0);
        assert_eq!(err.error(), &"test error");
        assert_eq!(err.into_error(), "test error");
    }

    #[test]
    fn test_source_is_final_error() {
        let err = RetryLimitExceeded::new(Offline, 1, 1, 0);
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("offline"));
    }
}
