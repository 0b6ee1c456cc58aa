//! # Tidewater
//!
//! > *"The tide comes in, the tide goes out"*
//!
//! Resilient polling for async sources: repeat an operation on a schedule,
//! back off and retry when it fails, and stop scheduling while nobody is
//! looking.
//!
//! ## Overview
//!
//! - **Pacing**: wait for each cycle to finish before the next delay, or run
//!   cycles on a fixed cadence that drops whatever is still in flight
//! - **Timing strategies**: constant, linear, exponential, random or computed
//!   from the session state
//! - **Retries**: failed cycles are retried up to a limit counted per streak
//!   of failures or over the whole session
//! - **Activity gating**: scheduling pauses while an activity signal is
//!   inactive and resumes with an immediate cycle
//!
//! ## Quick Example
//!
//! ```rust
//! use futures::StreamExt;
//! use tidewater::{poll_future, PollConfig, PollMode, RetryLimit, TimingStrategy};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let config = PollConfig::<u64, String>::new()
//!     .with_mode(PollMode::WaitForCompletion)
//!     .with_delay(TimingStrategy::constant(Duration::from_millis(10)))
//!     .with_retry(TimingStrategy::exponential(Duration::from_millis(5)))
//!     .with_retry_limit(RetryLimit::Limited(3))
//!     .with_pause_when_inactive(false);
//!
//! let mut counter = 0;
//! let polls = poll_future(
//!     move || {
//!         counter += 1;
//!         let n = counter;
//!         async move { Ok(n) }
//!     },
//!     config,
//! );
//!
//! let seen: Vec<u64> = polls.take(3).map(|item| item.unwrap_or(0)).collect().await;
//! assert_eq!(seen, vec![1, 2, 3]);
//! # });
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod activity;
pub mod config;
pub mod error;
pub mod gate;
pub mod poll;
pub mod retry;
pub mod scheduler;
pub mod state;
pub mod testing;
pub mod timing;

// Re-exports
pub use activity::{Activity, ActivitySignal};
pub use config::{NormalizedConfig, PollConfig, PollMode, PollSettings};
pub use error::ConfigError;
pub use gate::{VisibilityGate, TIMING_TOLERANCE};
pub use poll::{poll, poll_future, PollStream};
pub use retry::{RetryDecision, RetryGovernor, RetryLimit, RetryLimitExceeded};
pub use state::PollState;
pub use timing::{StrategyKind, TimingStrategy, WaitTime};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::activity::{Activity, ActivitySignal};
    pub use crate::config::{PollConfig, PollMode};
    pub use crate::poll::{poll, poll_future, PollStream};
    pub use crate::retry::{RetryLimit, RetryLimitExceeded};
    pub use crate::state::PollState;
    pub use crate::timing::{TimingStrategy, WaitTime};
}
