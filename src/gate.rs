//! Activity gating for the cycle scheduler.
//!
//! The [`VisibilityGate`] sits between the scheduler's trigger and the source:
//!
//! - the very first cycle of a session always starts, whatever the signal says
//! - while the signal is active every cycle starts
//! - a cycle that is already running is never interrupted by the signal; the
//!   pause takes effect once it has finished
//! - once paused, nothing starts until the signal is active again
//!
//! After each cycle the gate arms a *pause check* shortly before the next
//! scheduled start (see [`pause_delay`]). If the signal is inactive at that
//! point the scheduler pauses and drops the pending wait.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

/// Slack subtracted from the remaining wait when arming a pause check.
///
/// Timers fire with a little jitter; without the slack a cycle ending just
/// before its next start would look like it is still pending.
pub const TIMING_TOLERANCE: Duration = Duration::from_millis(100);

/// How long after a cycle ends the pause check should run.
///
/// `wait` is the time between the cycle's scheduled start and the next one,
/// `spent` is how much of it the cycle already used. Returns zero when the
/// remainder after [`TIMING_TOLERANCE`] is not positive.
///
/// # Examples
///
/// ```rust
/// use tidewater::gate::pause_delay;
/// use std::time::Duration;
///
/// // Fixed cadence: 200ms period, cycle took 50ms.
/// assert_eq!(
///     pause_delay(Duration::from_millis(200), Duration::from_millis(50)),
///     Duration::from_millis(50),
/// );
/// // Cycle overran its slot: check right away.
/// assert_eq!(
///     pause_delay(Duration::from_millis(50), Duration::from_millis(250)),
///     Duration::ZERO,
/// );
/// ```
pub fn pause_delay(wait: Duration, spent: Duration) -> Duration {
    wait.saturating_sub(spent).saturating_sub(TIMING_TOLERANCE)
}

/// `now + wait`, saturating far in the future instead of overflowing.
pub(crate) fn deadline_after(wait: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(wait)
        .unwrap_or_else(|| now + Duration::from_secs(60 * 60 * 24 * 365 * 30))
}

/// Gate between the scheduler's trigger and the activity signal.
#[derive(Debug)]
pub struct VisibilityGate {
    signal: Option<watch::Receiver<bool>>,
    opened: bool,
    pause_check: Option<Instant>,
}

impl VisibilityGate {
    /// A gate that follows `signal`.
    pub fn new(signal: watch::Receiver<bool>) -> Self {
        Self {
            signal: Some(signal),
            opened: false,
            pause_check: None,
        }
    }

    /// A gate that never pauses.
    pub fn always_open() -> Self {
        Self {
            signal: None,
            opened: false,
            pause_check: None,
        }
    }

    /// Whether the gate follows a signal at all.
    pub fn is_enabled(&self) -> bool {
        self.signal.is_some()
    }

    /// Current state of the signal; a gate without a signal is always active.
    pub fn is_active(&self) -> bool {
        self.signal.as_ref().map_or(true, |signal| *signal.borrow())
    }

    /// Ask to start a cycle.
    ///
    /// The first request always passes. Any pending pause check is dropped,
    /// since a new cycle supersedes it.
    pub fn admit(&mut self) -> bool {
        self.pause_check = None;
        if !self.opened {
            self.opened = true;
            return true;
        }
        self.is_active()
    }

    /// A cycle reached its terminal outcome; the next start is `wait` after
    /// its scheduled start and it already used `spent` of that.
    pub fn cycle_ended(&mut self, wait: Duration, spent: Duration) {
        if self.signal.is_some() {
            self.pause_check = Some(deadline_after(pause_delay(wait, spent)));
        }
    }

    /// When the armed pause check is due, if any.
    pub fn pause_check_at(&self) -> Option<Instant> {
        self.pause_check
    }

    /// Consume the due pause check; `true` when the session should pause.
    pub fn take_pause_check(&mut self) -> bool {
        self.pause_check.take().is_some() && !self.is_active()
    }

    /// Wait until the signal is active.
    ///
    /// A signal whose sender is gone can never change again; the gate then
    /// stops following it and counts as active from here on. Without a signal
    /// this never resolves.
    pub async fn resumed(&mut self) {
        let closed = match self.signal.as_mut() {
            Some(signal) => signal.wait_for(|active| *active).await.is_err(),
            None => return std::future::pending().await,
        };
        if closed {
            self.signal = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_delay_subtracts_tolerance() {
        assert_eq!(
            pause_delay(Duration::from_millis(200), Duration::ZERO),
            Duration::from_millis(100)
        );
        assert_eq!(
            pause_delay(Duration::from_millis(25), Duration::ZERO),
            Duration::ZERO
        );
    }

    #[test]
    fn test_first_admit_ignores_signal() {
        let (_tx, rx) = watch::channel(false);
        let mut gate = VisibilityGate::new(rx);

        assert!(gate.admit());
        assert!(!gate.admit());
    }

    #[test]
    fn test_admit_follows_signal_after_first() {
        let (tx, rx) = watch::channel(true);
        let mut gate = VisibilityGate::new(rx);

        assert!(gate.admit());
        tx.send_replace(false);
        assert!(!gate.admit());
        tx.send_replace(true);
        assert!(gate.admit());
    }

    #[test]
    fn test_always_open_gate() {
        let mut gate = VisibilityGate::always_open();

        assert!(!gate.is_enabled());
        assert!(gate.admit());
        assert!(gate.admit());
        gate.cycle_ended(Duration::from_secs(1), Duration::ZERO);
        assert!(gate.pause_check_at().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_check_only_pauses_when_inactive() {
        let (tx, rx) = watch::channel(true);
        let mut gate = VisibilityGate::new(rx);
        gate.admit();

        let start = Instant::now();
        gate.cycle_ended(Duration::from_millis(1000), Duration::from_millis(300));
        assert_eq!(
            gate.pause_check_at(),
            Some(start + Duration::from_millis(600))
        );
        assert!(!gate.take_pause_check());
        assert!(gate.pause_check_at().is_none());

        gate.cycle_ended(Duration::from_millis(1000), Duration::ZERO);
        tx.send_replace(false);
        assert!(gate.take_pause_check());
    }

    #[tokio::test(start_paused = true)]
    async fn test_admit_clears_pause_check() {
        let (_tx, rx) = watch::channel(false);
        let mut gate = VisibilityGate::new(rx);
        gate.admit();
        gate.cycle_ended(Duration::from_millis(500), Duration::ZERO);

        gate.admit();
        assert!(gate.pause_check_at().is_none());
    }

    #[tokio::test]
    async fn test_resumed_waits_for_active() {
        let (tx, rx) = watch::channel(false);
        let mut gate = VisibilityGate::new(rx);

        let waiter = tokio::spawn(async move {
            gate.resumed().await;
            gate.is_active()
        });
        tx.send_replace(true);

        assert!(waiter.await.unwrap_or(false));
    }

    #[tokio::test]
    async fn test_resumed_when_sender_dropped() {
        let (tx, rx) = watch::channel(false);
        let mut gate = VisibilityGate::new(rx);
        drop(tx);

        gate.resumed().await;
        assert!(!gate.is_enabled());
        assert!(gate.is_active());
    }
}
