//! The session state machine.

use std::pin::Pin;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::time::Instant;

use crate::config::{NormalizedConfig, PollMode};
use crate::gate::{deadline_after, VisibilityGate};
use crate::retry::{RetryDecision, RetryGovernor, RetryLimitExceeded};
use crate::state::PollState;
use crate::timing::TimeProducer;

/// A cycle that has started and not yet reached its terminal outcome.
struct InFlight<S, T> {
    stream: Pin<Box<S>>,
    started: Instant,
    last: Option<T>,
}

enum Event<T, E> {
    Item(T),
    Failed(E),
    Completed,
    TimerElapsed,
    PauseCheck,
    Resumed,
}

/// Drives one poll session.
///
/// `source` is called once per cycle and the stream it returns is polled
/// until it ends (success), yields an error (failure) or is dropped
/// (cancellation). Every value a cycle yields is handed out by
/// [`Scheduler::next`]; the last one feeds the timing callbacks.
///
/// The scheduler is a plain state machine: nothing runs unless `next` is
/// being awaited, and dropping it drops the in-flight cycle and every pending
/// wait along with it.
///
/// # Examples
///
/// ```rust
/// use futures::stream;
/// use tidewater::scheduler::Scheduler;
/// use tidewater::PollConfig;
///
/// # tokio_test::block_on(async {
/// let mut calls = 0u32;
/// let config = PollConfig::<u32, String>::new().with_pause_when_inactive(false);
/// let mut scheduler = Scheduler::new(
///     move || {
///         calls += 1;
///         stream::iter(vec![Ok::<u32, String>(calls)])
///     },
///     config.normalize(),
/// );
///
/// assert_eq!(scheduler.next().await, Some(Ok(1)));
/// assert_eq!(scheduler.state().poll_count(), 0);
/// # });
/// ```
pub struct Scheduler<F, S, T, E> {
    source: F,
    mode: PollMode,
    delay: TimeProducer<T, E>,
    governor: RetryGovernor<T, E>,
    gate: VisibilityGate,
    state: PollState<T, E>,
    cycle: Option<InFlight<S, T>>,
    timer: Option<Instant>,
    last_wait: Duration,
    paused: bool,
    finished: bool,
}

impl<F, S, T, E> Scheduler<F, S, T, E>
where
    F: FnMut() -> S,
    S: Stream<Item = Result<T, E>>,
    T: Clone,
{
    /// Create a session. Nothing starts until [`Scheduler::next`] is polled.
    pub fn new(source: F, config: NormalizedConfig<T, E>) -> Self {
        let gate = match config.activity() {
            Some(signal) => VisibilityGate::new(signal),
            None => VisibilityGate::always_open(),
        };

        Self {
            source,
            mode: config.mode(),
            delay: config.delay_producer(),
            governor: config.retry_governor(),
            gate,
            state: PollState::new(),
            cycle: None,
            timer: None,
            last_wait: Duration::ZERO,
            paused: false,
            finished: false,
        }
    }

    /// Session counters and the last value and error.
    pub fn state(&self) -> &PollState<T, E> {
        &self.state
    }

    /// Whether the session is waiting for the activity signal.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// When the next cycle is due to start, if a wait is pending.
    pub fn next_start(&self) -> Option<Instant> {
        self.timer
    }

    /// Next value of the session.
    ///
    /// Returns `Some(Err(_))` exactly once, when the retry limit is exceeded;
    /// every call after that returns `None`.
    pub async fn next(&mut self) -> Option<Result<T, RetryLimitExceeded<E>>> {
        loop {
            if self.finished {
                return None;
            }

            if self.cycle.is_none() && self.timer.is_none() && !self.paused {
                self.start_cycle();
                continue;
            }

            let paused = self.paused;
            let event = tokio::select! {
                biased;
                event = next_event(&mut self.cycle) => event,
                () = sleep_until_opt(self.gate.pause_check_at()) => Event::PauseCheck,
                () = sleep_until_opt(self.timer) => Event::TimerElapsed,
                () = self.gate.resumed(), if paused => Event::Resumed,
            };

            match event {
                Event::Item(value) => {
                    if let Some(cycle) = self.cycle.as_mut() {
                        cycle.last = Some(value.clone());
                    }
                    return Some(Ok(value));
                }
                Event::Failed(error) => {
                    if let Some(exceeded) = self.fail(error) {
                        return Some(Err(exceeded));
                    }
                }
                Event::Completed => self.complete(),
                Event::TimerElapsed => {
                    self.timer = None;
                    self.start_cycle();
                }
                Event::PauseCheck => {
                    if self.gate.take_pause_check() {
                        self.pause();
                    }
                }
                Event::Resumed => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("activity resumed, restarting poll");

                    self.paused = false;
                    self.timer = Some(Instant::now());
                }
            }
        }
    }

    fn start_cycle(&mut self) {
        if !self.gate.admit() {
            self.pause();
            return;
        }

        if self.mode == PollMode::FixedCadence {
            if self.cycle.take().is_some() {
                #[cfg(feature = "tracing")]
                tracing::debug!("cadence elapsed, cancelling in-flight cycle");
            }
            self.state.increment_poll();
            let wait = self.delay.wait(&self.state);
            self.last_wait = wait;
            self.timer = Some(deadline_after(wait));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            poll_count = self.state.poll_count(),
            retry_count = self.state.retry_count(),
            "poll cycle started"
        );

        self.cycle = Some(InFlight {
            stream: Box::pin((self.source)()),
            started: Instant::now(),
            last: None,
        });
    }

    fn complete(&mut self) {
        let Some(cycle) = self.cycle.take() else {
            return;
        };
        if let Some(value) = cycle.last {
            self.state.set_value(value);
        }
        self.governor.on_success(&mut self.state);

        match self.mode {
            PollMode::WaitForCompletion => {
                self.state.increment_poll();
                let wait = self.delay.wait(&self.state);
                self.last_wait = wait;
                self.timer = Some(deadline_after(wait));
                self.gate.cycle_ended(wait, Duration::ZERO);
            }
            PollMode::FixedCadence => {
                if self.timer.is_some() {
                    self.gate.cycle_ended(self.last_wait, cycle.started.elapsed());
                }
            }
        }
    }

    fn fail(&mut self, error: E) -> Option<RetryLimitExceeded<E>> {
        self.cycle = None;

        match self.governor.on_failure(&mut self.state, error) {
            // While paused the resume restarts the cycle; nothing to arm.
            RetryDecision::Retry(_) if self.paused => None,
            RetryDecision::Retry(wait) => {
                self.last_wait = wait;
                self.timer = Some(deadline_after(wait));
                self.gate.cycle_ended(wait, Duration::ZERO);
                None
            }
            RetryDecision::GiveUp(exceeded) => {
                self.finished = true;
                self.timer = None;
                Some(exceeded)
            }
        }
    }

    fn pause(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            in_flight = self.cycle.is_some(),
            "activity inactive, pausing poll"
        );

        self.paused = true;
        self.timer = None;
    }
}

impl<F, S, T, E> std::fmt::Debug for Scheduler<F, S, T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("mode", &self.mode)
            .field("gate", &self.gate)
            .field("in_flight", &self.cycle.is_some())
            .field("timer", &self.timer)
            .field("paused", &self.paused)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

async fn next_event<S, T, E>(cycle: &mut Option<InFlight<S, T>>) -> Event<T, E>
where
    S: Stream<Item = Result<T, E>>,
{
    match cycle {
        Some(cycle) => match cycle.stream.next().await {
            Some(Ok(value)) => Event::Item(value),
            Some(Err(error)) => Event::Failed(error),
            None => Event::Completed,
        },
        None => std::future::pending().await,
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
