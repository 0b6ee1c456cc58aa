//! Entry points: turn a source into a resilient poll stream.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{self, BoxStream, Stream, StreamExt};

use crate::config::PollConfig;
use crate::retry::RetryLimitExceeded;
use crate::scheduler::Scheduler;

/// Stream of values produced by a poll session.
///
/// Yields every value the source produces, forever. The only way it ends on
/// its own is a single `Err(RetryLimitExceeded)` once the retry limit is
/// exceeded. Dropping it cancels the in-flight cycle and any pending wait.
pub struct PollStream<T, E> {
    inner: BoxStream<'static, Result<T, RetryLimitExceeded<E>>>,
}

impl<T, E> Stream for PollStream<T, E> {
    type Item = Result<T, RetryLimitExceeded<E>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl<T, E> fmt::Debug for PollStream<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollStream").finish_non_exhaustive()
    }
}

/// Poll `source` according to `config`.
///
/// `source` is called once per cycle. The stream it returns is one cycle:
/// its values are forwarded as they arrive, its end is a success and an
/// `Err` item is a failure handed to the retry logic. Nothing runs until the
/// returned stream is polled.
///
/// # Examples
///
/// ```rust
/// use futures::{stream, StreamExt};
/// use tidewater::{poll, PollConfig, TimingStrategy};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let mut page = 0u32;
/// let config = PollConfig::<u32, String>::new()
///     .with_delay(TimingStrategy::constant(Duration::from_millis(5)))
///     .with_pause_when_inactive(false);
///
/// let polls = poll(
///     move || {
///         page += 1;
///         stream::iter(vec![Ok(page * 10), Ok(page * 10 + 1)])
///     },
///     config,
/// );
///
/// let values: Vec<u32> = polls
///     .take(4)
///     .filter_map(|item| async move { item.ok() })
///     .collect()
///     .await;
/// assert_eq!(values, vec![10, 11, 20, 21]);
/// # });
/// ```
pub fn poll<F, S, T, E>(source: F, config: PollConfig<T, E>) -> PollStream<T, E>
where
    F: FnMut() -> S + Send + 'static,
    S: Stream<Item = Result<T, E>> + Send + 'static,
    T: Clone + Send + 'static,
    E: Send + 'static,
{
    let scheduler = Scheduler::new(source, config.normalize());

    let inner = stream::unfold(scheduler, |mut scheduler| async move {
        let item = scheduler.next().await?;
        Some((item, scheduler))
    })
    .boxed();

    PollStream { inner }
}

/// Poll a future-returning `source`; each cycle yields exactly one value.
///
/// # Examples
///
/// ```rust
/// use futures::StreamExt;
/// use tidewater::{poll_future, PollConfig, TimingStrategy};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let config = PollConfig::<&str, String>::new()
///     .with_delay(TimingStrategy::constant(Duration::from_millis(5)))
///     .with_pause_when_inactive(false);
/// let mut polls = poll_future(|| async { Ok("ready") }, config);
///
/// assert_eq!(polls.next().await, Some(Ok("ready")));
/// # });
/// ```
pub fn poll_future<F, Fut, T, E>(mut source: F, config: PollConfig<T, E>) -> PollStream<T, E>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Clone + Send + 'static,
    E: Send + 'static,
{
    poll(move || stream::once(source()), config)
}
