//! Per-session poll state.
//!
//! [`PollState`] is the single record every part of a poll session consults:
//! the scheduler advances `poll_count` and stores values, the retry governor
//! advances the retry counters and stores errors, and timing strategies read
//! it to compute the next wait.
//!
//! Callers only ever see it through a shared borrow (for example inside a
//! [`TimingStrategy::Dynamic`](crate::TimingStrategy::Dynamic) callback), so
//! the live state cannot be modified from outside the session.

/// Counters, last value and last error of a poll session.
///
/// # Invariants
///
/// - `consecutive_retry_count() <= retry_count()`
/// - `poll_count()` and `retry_count()` never decrease
///
/// # Examples
///
/// ```rust
/// use tidewater::PollState;
///
/// let state = PollState::<u32, String>::new();
///
/// assert_eq!(state.poll_count(), 0);
/// assert_eq!(state.retry_count(), 0);
/// assert!(state.value().is_none());
/// assert!(state.error().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PollState<T, E> {
    value: Option<T>,
    error: Option<E>,
    poll_count: u32,
    retry_count: u32,
    consecutive_retry_count: u32,
}

impl<T, E> PollState<T, E> {
    /// Create a fresh state with all counters at zero and no value or error.
    pub fn new() -> Self {
        Self {
            value: None,
            error: None,
            poll_count: 0,
            retry_count: 0,
            consecutive_retry_count: 0,
        }
    }

    /// Last value produced by a successfully completed cycle.
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Most recent failure, cleared again by the next successful cycle.
    pub fn error(&self) -> Option<&E> {
        self.error.as_ref()
    }

    /// Number of completed (non-retry) cycles.
    pub fn poll_count(&self) -> u32 {
        self.poll_count
    }

    /// Retry attempts over the whole session.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Retry attempts since the last successful cycle.
    pub fn consecutive_retry_count(&self) -> u32 {
        self.consecutive_retry_count
    }

    pub(crate) fn set_value(&mut self, value: T) {
        self.value = Some(value);
    }

    pub(crate) fn set_error(&mut self, error: E) {
        self.error = Some(error);
    }

    pub(crate) fn increment_poll(&mut self) {
        self.poll_count = self.poll_count.saturating_add(1);
    }

    pub(crate) fn increment_retry(&mut self) {
        self.retry_count = self.retry_count.saturating_add(1);
        self.consecutive_retry_count = self.consecutive_retry_count.saturating_add(1);
    }

    /// Clear the transient error state after a successful cycle.
    ///
    /// `retry_count` is a lifetime counter and is left untouched.
    pub(crate) fn reset_error(&mut self) {
        self.error = None;
        self.consecutive_retry_count = 0;
    }
}

impl<T, E> Default for PollState<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_empty() {
        let state = PollState::<i32, &str>::new();
        assert_eq!(state, PollState::default());
        assert_eq!(state.consecutive_retry_count(), 0);
    }

    #[test]
    fn test_increment_retry_advances_both_counters() {
        let mut state = PollState::<i32, &str>::new();
        state.increment_retry();
        state.increment_retry();

        assert_eq!(state.retry_count(), 2);
        assert_eq!(state.consecutive_retry_count(), 2);
    }

    #[test]
    fn test_reset_error_keeps_lifetime_retry_count() {
        let mut state = PollState::<i32, &str>::new();
        state.set_error("boom");
        state.increment_retry();
        state.reset_error();

        assert!(state.error().is_none());
        assert_eq!(state.consecutive_retry_count(), 0);
        assert_eq!(state.retry_count(), 1);
    }

    #[test]
    fn test_counters_saturate() {
        let mut state = PollState::<i32, &str> {
            poll_count: u32::MAX,
            retry_count: u32::MAX,
            consecutive_retry_count: u32::MAX,
            ..PollState::new()
        };
        state.increment_poll();
        state.increment_retry();

        assert_eq!(state.poll_count(), u32::MAX);
        assert_eq!(state.retry_count(), u32::MAX);
    }

    #[test]
    fn test_value_is_kept_until_replaced() {
        let mut state = PollState::<i32, &str>::new();
        state.set_value(1);
        state.set_error("later failure");

        assert_eq!(state.value(), Some(&1));
        state.set_value(2);
        assert_eq!(state.value(), Some(&2));
    }
}
