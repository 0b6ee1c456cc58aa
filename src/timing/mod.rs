//! Timing strategies for poll delays and retry waits.
//!
//! Strategies are plain data describing *how long* to wait; [`evaluate`]
//! binds one to the counter it should grow with and to a fallback wait,
//! producing a [`TimeProducer`] the scheduler consults after every cycle.
//!
//! # Strategies
//!
//! - **Constant**: the same wait every time
//! - **Linear**: `attempt * time` (100ms, 200ms, 300ms, ...)
//! - **Exponential**: `2^(attempt - 1) * time` (100ms, 200ms, 400ms, ...)
//! - **Random**: a whole number of milliseconds in `[min, max]`
//! - **Dynamic**: a callback reading the [`PollState`](crate::PollState)
//!
//! The attempt is `poll_count` for delays and the (consecutive) retry count
//! for retries, see [`TimingMode`].
//!
//! # Normalization
//!
//! Whatever a strategy produces is cleaned up by [`normalize_millis`]:
//! negative values are mirrored, non-finite or missing values fall back to
//! the default.
//!
//! ```rust
//! use tidewater::timing::{evaluate, TimingMode};
//! use tidewater::{PollState, TimingStrategy};
//! use std::time::Duration;
//!
//! let producer = evaluate(
//!     TimingMode::Delay,
//!     TimingStrategy::<u32, String>::dynamic(|_| -300.0),
//!     Duration::from_secs(1),
//! );
//!
//! assert_eq!(producer.wait(&PollState::new()), Duration::from_millis(300));
//! ```

mod normalize;
mod strategy;

pub use normalize::{millis_to_duration, normalize_millis, sample_millis};
pub use strategy::{
    evaluate, DynamicTime, StrategyKind, TimeProducer, TimingMode, TimingStrategy, WaitTime,
};
