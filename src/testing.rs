//! Testing utilities for poll sessions.
//!
//! [`ScriptedSource`] plays back a script of cycles, each one a sequence of
//! values or errors emitted after fixed delays, and counts how many cycles
//! were started, completed and cancelled. Combined with tokio's paused clock
//! (`#[tokio::test(start_paused = true)]`) it makes every timing of a poll
//! session exactly reproducible.
//!
//! # Examples
//!
//! ```rust
//! use tidewater::testing::{Cycle, ScriptedSource};
//! use tidewater::{assert_polled, poll, PollConfig};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let source = ScriptedSource::new()
//!     .then(Cycle::value(Duration::from_millis(10), 1))
//!     .then(Cycle::value(Duration::from_millis(10), 2));
//! let probe = source.probe();
//!
//! let config = PollConfig::<u32, String>::new()
//!     .with_delay(tidewater::TimingStrategy::constant(Duration::ZERO))
//!     .with_pause_when_inactive(false);
//! let mut polls = poll(source.into_source(), config);
//!
//! assert_polled!(polls, 1);
//! assert_polled!(polls, 2);
//! assert_eq!(probe.starts(), 2);
//! # });
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};

/// One scripted cycle: items emitted in order, each after its own delay,
/// then the stream ends after `tail`.
///
/// An error item is terminal for the cycle; anything scripted after it is
/// never reached.
#[derive(Debug, Clone)]
pub struct Cycle<T, E> {
    items: Vec<(Duration, Result<T, E>)>,
    tail: Duration,
}

impl<T, E> Cycle<T, E> {
    /// A cycle that emits nothing and ends immediately.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            tail: Duration::ZERO,
        }
    }

    /// A cycle that emits `value` after `after` and ends.
    pub fn value(after: Duration, value: T) -> Self {
        Self::new().emit(after, value)
    }

    /// A cycle that fails with `error` after `after`.
    pub fn error(after: Duration, error: E) -> Self {
        Self::new().fail(after, error)
    }

    /// A cycle that runs for `after` and ends without emitting.
    pub fn empty(after: Duration) -> Self {
        Self::new().finish_after(after)
    }

    /// Append a value emitted `after` the previous item.
    pub fn emit(mut self, after: Duration, value: T) -> Self {
        self.items.push((after, Ok(value)));
        self
    }

    /// Append an error emitted `after` the previous item.
    pub fn fail(mut self, after: Duration, error: E) -> Self {
        self.items.push((after, Err(error)));
        self
    }

    /// Keep running for `tail` after the last item before ending.
    pub fn finish_after(mut self, tail: Duration) -> Self {
        self.tail = tail;
        self
    }
}

impl<T, E> Default for Cycle<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct Counters {
    starts: AtomicUsize,
    completions: AtomicUsize,
    cancellations: AtomicUsize,
}

/// Read-only view of a [`ScriptedSource`]'s counters.
///
/// Stays valid after the source has been handed to a poll session.
#[derive(Debug, Clone)]
pub struct SourceProbe {
    counters: Arc<Counters>,
}

impl SourceProbe {
    /// Cycles started so far.
    pub fn starts(&self) -> usize {
        self.counters.starts.load(Ordering::SeqCst)
    }

    /// Cycles that reached their terminal outcome (end of stream or error).
    pub fn completions(&self) -> usize {
        self.counters.completions.load(Ordering::SeqCst)
    }

    /// Cycles dropped before their terminal outcome.
    pub fn cancellations(&self) -> usize {
        self.counters.cancellations.load(Ordering::SeqCst)
    }
}

/// Cycle factory that plays back scripted cycles.
///
/// Cycles are handed out in the order they were added. Once the script runs
/// out the last cycle is repeated; an empty script yields empty cycles.
#[derive(Debug)]
pub struct ScriptedSource<T, E> {
    script: VecDeque<Cycle<T, E>>,
    counters: Arc<Counters>,
}

impl<T, E> ScriptedSource<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// An empty script.
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            counters: Arc::default(),
        }
    }

    /// A source running `cycle` forever.
    pub fn repeating(cycle: Cycle<T, E>) -> Self {
        Self::new().then(cycle)
    }

    /// Append a cycle to the script.
    pub fn then(mut self, cycle: Cycle<T, E>) -> Self {
        self.script.push_back(cycle);
        self
    }

    /// Counters that outlive the source.
    pub fn probe(&self) -> SourceProbe {
        SourceProbe {
            counters: Arc::clone(&self.counters),
        }
    }

    /// Turn the script into a cycle factory for [`poll`](crate::poll).
    pub fn into_source(mut self) -> impl FnMut() -> BoxStream<'static, Result<T, E>> + Send {
        move || {
            let cycle = if self.script.len() > 1 {
                self.script.pop_front().unwrap_or_default()
            } else {
                self.script.front().cloned().unwrap_or_default()
            };
            play(cycle, Arc::clone(&self.counters))
        }
    }
}

impl<T, E> Default for ScriptedSource<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Counts the cycle as completed or cancelled when dropped.
struct CycleGuard {
    counters: Arc<Counters>,
    finished: bool,
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        let counter = if self.finished {
            &self.counters.completions
        } else {
            &self.counters.cancellations
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

fn play<T, E>(cycle: Cycle<T, E>, counters: Arc<Counters>) -> BoxStream<'static, Result<T, E>>
where
    T: Send + 'static,
    E: Send + 'static,
{
    counters.starts.fetch_add(1, Ordering::SeqCst);
    let guard = CycleGuard {
        counters,
        finished: false,
    };

    stream::unfold(
        (cycle.items.into_iter(), cycle.tail, Some(guard)),
        |(mut items, tail, mut guard)| async move {
            let mut current = guard.take()?;
            match items.next() {
                Some((after, item)) => {
                    if !after.is_zero() {
                        tokio::time::sleep(after).await;
                    }
                    if item.is_err() {
                        current.finished = true;
                        return Some((item, (items, tail, None)));
                    }
                    Some((item, (items, tail, Some(current))))
                }
                None => {
                    if !tail.is_zero() {
                        tokio::time::sleep(tail).await;
                    }
                    current.finished = true;
                    None
                }
            }
        },
    )
    .boxed()
}

/// Assert that the next item of a poll stream is the given value.
///
/// # Example
///
/// ```rust
/// use tidewater::{assert_polled, poll_future, PollConfig};
///
/// # tokio_test::block_on(async {
/// let config = PollConfig::<u32, String>::new().with_pause_when_inactive(false);
/// let mut polls = poll_future(|| async { Ok(7) }, config);
/// assert_polled!(polls, 7);
/// # });
/// ```
#[macro_export]
macro_rules! assert_polled {
    ($stream:expr, $expected:expr) => {
        match ::futures::StreamExt::next(&mut $stream).await {
            Some(Ok(value)) => assert_eq!(value, $expected),
            Some(Err(e)) => panic!("Expected value, got terminal error: {:?}", e),
            None => panic!("Expected value, but the poll stream ended"),
        }
    };
}

/// Assert that the next item of a poll stream is the terminal error.
///
/// Evaluates to the [`RetryLimitExceeded`](crate::RetryLimitExceeded).
///
/// # Example
///
/// ```rust
/// use tidewater::{assert_exceeded, poll_future, PollConfig, RetryLimit};
///
/// # tokio_test::block_on(async {
/// let config = PollConfig::<u32, &str>::new().with_retry_limit(RetryLimit::Limited(0));
/// let mut polls = poll_future(|| async { Err("down") }, config);
/// let exceeded = assert_exceeded!(polls);
/// assert_eq!(exceeded.final_error, "down");
/// # });
/// ```
#[macro_export]
macro_rules! assert_exceeded {
    ($stream:expr) => {
        match ::futures::StreamExt::next(&mut $stream).await {
            Some(Err(exceeded)) => exceeded,
            Some(Ok(value)) => panic!("Expected terminal error, got value: {:?}", value),
            None => panic!("Expected terminal error, but the poll stream ended"),
        }
    };
}

#[cfg(feature = "proptest")]
use proptest::prelude::*;

#[cfg(feature = "proptest")]
impl Arbitrary for crate::RetryLimit {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        prop_oneof![
            4 => (0u32..20).prop_map(crate::RetryLimit::Limited),
            1 => Just(crate::RetryLimit::Unlimited),
        ]
        .boxed()
    }
}

/// Numeric timing strategies with arbitrary, possibly out-of-range, times.
///
/// Times span negative values and zero so normalization gets exercised.
#[cfg(feature = "proptest")]
pub fn timing_strategy<T: 'static, E: 'static>() -> BoxedStrategy<crate::TimingStrategy<T, E>> {
    let time = -1.0e6f64..1.0e6;
    prop_oneof![
        time.clone().prop_map(crate::TimingStrategy::Constant),
        time.clone().prop_map(crate::TimingStrategy::Linear),
        (-1.0e4f64..1.0e4).prop_map(crate::TimingStrategy::Exponential),
        (time.clone(), time).prop_map(|(min, max)| crate::TimingStrategy::Random(min, max)),
    ]
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn scripted_cycles_play_in_order() {
        let source = ScriptedSource::<u32, &str>::new()
            .then(Cycle::value(ms(10), 1))
            .then(Cycle::error(ms(20), "boom"));
        let probe = source.probe();
        let mut factory = source.into_source();

        let first: Vec<_> = factory().collect().await;
        let second: Vec<_> = factory().collect().await;
        let third: Vec<_> = factory().collect().await;

        assert_eq!(first, vec![Ok(1)]);
        assert_eq!(second, vec![Err("boom")]);
        assert_eq!(third, vec![Err("boom")]);
        assert_eq!(probe.starts(), 3);
        assert_eq!(probe.completions(), 3);
        assert_eq!(probe.cancellations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn delays_are_honored() {
        let source = ScriptedSource::<u32, &str>::repeating(
            Cycle::new().emit(ms(100), 1).emit(ms(50), 2).finish_after(ms(25)),
        );
        let mut factory = source.into_source();
        let start = tokio::time::Instant::now();

        let items: Vec<_> = factory().collect().await;

        assert_eq!(items, vec![Ok(1), Ok(2)]);
        assert_eq!(start.elapsed(), ms(175));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_a_cycle_counts_as_cancellation() {
        let source = ScriptedSource::<u32, &str>::repeating(Cycle::value(ms(100), 1));
        let probe = source.probe();
        let mut factory = source.into_source();

        let mut cycle = factory();
        let early = tokio::time::timeout(ms(10), cycle.next()).await;
        assert!(early.is_err());
        drop(cycle);

        assert_eq!(probe.starts(), 1);
        assert_eq!(probe.cancellations(), 1);
        assert_eq!(probe.completions(), 0);
    }

    #[tokio::test]
    async fn empty_script_yields_empty_cycles() {
        let source = ScriptedSource::<u32, &str>::new();
        let probe = source.probe();
        let mut factory = source.into_source();

        let items: Vec<_> = factory().collect().await;

        assert!(items.is_empty());
        assert_eq!(probe.completions(), 1);
    }

    #[cfg(feature = "proptest")]
    mod proptest_tests {
        use super::*;
        use crate::state::PollState;
        use crate::timing::{evaluate, TimingMode};

        proptest! {
            #[test]
            fn arbitrary_strategies_evaluate_to_finite_waits(
                strategy in timing_strategy::<u32, String>(),
                polls in 0u32..40,
            ) {
                let producer = evaluate(TimingMode::Delay, strategy, Duration::from_secs(1));
                let mut state = PollState::new();
                for _ in 0..polls {
                    state.increment_poll();
                }

                let ms = producer.millis(&state);
                prop_assert!(ms.is_finite());
                prop_assert!(ms >= 0.0);
            }

            #[test]
            fn arbitrary_limits_are_consistent(limit in any::<crate::RetryLimit>()) {
                match limit {
                    crate::RetryLimit::Limited(n) => prop_assert!(limit.is_exceeded_by(n + 1)),
                    crate::RetryLimit::Unlimited => prop_assert!(!limit.is_exceeded_by(u32::MAX)),
                }
            }
        }
    }
}
