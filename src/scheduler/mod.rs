//! Cycle scheduling.
//!
//! A *cycle* is one run of the polled source, from the moment the factory is
//! called until its stream ends (success), yields an error (failure) or is
//! dropped (cancellation). The [`Scheduler`] decides when cycles start:
//!
//! - **Wait for completion**: after a cycle succeeds, `poll_count` is bumped,
//!   its last value stored, and the delay is computed from that state. The
//!   next cycle starts once the delay has elapsed.
//! - **Fixed cadence**: a trigger fires every computed delay, whatever the
//!   cycle is doing. Each trigger bumps `poll_count`, drops a cycle still in
//!   flight and starts a fresh one.
//!
//! Failures in either mode go to the [`RetryGovernor`](crate::RetryGovernor):
//! the session either waits the retry time and starts again, or ends with
//! [`RetryLimitExceeded`](crate::RetryLimitExceeded).
//!
//! Starts pass through a [`VisibilityGate`](crate::VisibilityGate), which
//! pauses the session while the activity signal is inactive and restarts it
//! with an immediate cycle once it is active again.

mod engine;

pub use engine::Scheduler;
