//! Failure recovery for poll cycles.
//!
//! When a cycle fails, the [`RetryGovernor`] records the error on the
//! [`PollState`](crate::PollState), advances the retry counters and either
//! schedules another attempt or ends the session:
//!
//! 1. store the error, bump `retry_count` and `consecutive_retry_count`
//! 2. compare the counted retries against the [`RetryLimit`]
//! 3. past the limit: the session ends with [`RetryLimitExceeded`]
//! 4. otherwise: wait the retry time, then run the cycle again
//!
//! A successful cycle clears the error and the consecutive count; the
//! lifetime `retry_count` keeps growing.
//!
//! # Consecutive vs. lifetime limits
//!
//! ```rust
//! use tidewater::{PollConfig, RetryLimit};
//!
//! // Tolerate up to 3 failures in a row, forever (the default).
//! let flaky: PollConfig<u32, String> = PollConfig::new()
//!     .with_retry_limit(RetryLimit::Limited(3))
//!     .with_consecutive_only(true);
//!
//! // Give up after 3 failures over the whole session.
//! let strict: PollConfig<u32, String> = PollConfig::new()
//!     .with_retry_limit(RetryLimit::Limited(3))
//!     .with_consecutive_only(false);
//! # let _ = (flaky, strict);
//! ```

mod error;
mod governor;

pub use error::RetryLimitExceeded;
pub use governor::{RetryDecision, RetryGovernor, RetryLimit};
