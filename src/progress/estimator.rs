//! Timer-driven progress estimator.

use super::phase::PhaseSequence;
use super::run::{EstimationRun, ProgressSnapshot, TickOutcome};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Default recomputation cadence.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

type CompletionCallback = Box<dyn Fn() + Send + Sync>;

/// Builder for [`ProgressEstimator`].
#[derive(Default)]
pub struct ProgressEstimatorBuilder {
    tick_interval: Option<Duration>,
    on_complete: Option<CompletionCallback>,
}

impl ProgressEstimatorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how often progress is recomputed. Defaults to 100ms.
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = Some(interval);
        self
    }

    /// Sets the callback fired once per run after completion reaches 100%.
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Builds the estimator.
    pub fn build(self) -> ProgressEstimator {
        let (updates, _) = watch::channel(ProgressSnapshot::idle());
        let tick_interval = self
            .tick_interval
            .filter(|d| !d.is_zero())
            .unwrap_or(DEFAULT_TICK_INTERVAL);

        ProgressEstimator {
            shared: Arc::new(Shared {
                run: Mutex::new(None),
                next_generation: AtomicU64::new(0),
                on_complete: self.on_complete.unwrap_or_else(|| Box::new(|| {})),
                updates,
            }),
            ticker: Mutex::new(None),
            tick_interval,
        }
    }
}

struct ActiveRun {
    generation: u64,
    run: EstimationRun,
}

struct Shared {
    run: Mutex<Option<ActiveRun>>,
    next_generation: AtomicU64,
    on_complete: CompletionCallback,
    updates: watch::Sender<ProgressSnapshot>,
}

impl Shared {
    fn lock_run(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        self.run.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advances the run if it still belongs to `generation`.
    ///
    /// Snapshots are published under the run lock so a stale ticker can
    /// never overwrite what `stop` or a newer `start` published.
    fn tick(&self, generation: u64) -> TickOutcome {
        let now = Instant::now().into_std();
        let outcome = {
            let mut guard = self.lock_run();
            let Some(active) = guard.as_mut().filter(|a| a.generation == generation) else {
                return TickOutcome::Inert;
            };
            let outcome = active.run.sample(now);
            if outcome != TickOutcome::Inert {
                self.updates.send_replace(active.run.snapshot());
            }
            if outcome == TickOutcome::Completed {
                *guard = None;
            }
            outcome
        };

        if outcome == TickOutcome::Completed {
            tracing::debug!(generation, "progress run completed");
            (self.on_complete)();
        }
        outcome
    }
}

/// Simulates smoothly advancing progress over a [`PhaseSequence`].
///
/// Progress never enters the sequence's final window until
/// [`signal_real_completion`](Self::signal_real_completion) is called; after
/// that the final window plays out and the completion callback fires once.
///
/// ```no_run
/// use nb_studio::progress::{CreativeMode, ProgressEstimator};
///
/// # async fn run() {
/// let estimator = ProgressEstimator::builder()
///     .on_complete(|| println!("done"))
///     .build();
/// let answer = estimator
///     .track(CreativeMode::PromptOnly.phases(), async { 42 })
///     .await;
/// assert_eq!(answer, 42);
/// # }
/// ```
pub struct ProgressEstimator {
    shared: Arc<Shared>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    tick_interval: Duration,
}

impl ProgressEstimator {
    /// Creates a new `ProgressEstimatorBuilder`.
    pub fn builder() -> ProgressEstimatorBuilder {
        ProgressEstimatorBuilder::new()
    }

    /// Creates an estimator with the default cadence and the given callback.
    pub fn new<F>(on_complete: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::builder().on_complete(on_complete).build()
    }

    /// Returns the recomputation cadence.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    fn lock_ticker(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.ticker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancel_ticker(&self) {
        if let Some(handle) = self.lock_ticker().take() {
            handle.abort();
        }
    }

    /// Begins a new run, discarding any run in progress without firing its
    /// callback.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, sequence: PhaseSequence) {
        self.cancel_ticker();

        let generation = self.shared.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let run = EstimationRun::start(sequence, Instant::now().into_std());
        let snapshot = run.snapshot();
        tracing::debug!(
            generation,
            phases = run.sequence().len(),
            total_ms = run.sequence().total_ms(),
            final_window_ms = run.sequence().final_window_ms(),
            "progress run started"
        );
        {
            let mut guard = self.shared.lock_run();
            *guard = Some(ActiveRun { generation, run });
            self.shared.updates.send_replace(snapshot);
        }

        let shared = Arc::clone(&self.shared);
        let period = self.tick_interval;
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if shared.tick(generation) != TickOutcome::Running {
                    break;
                }
            }
        });
        *self.lock_ticker() = Some(handle);
    }

    /// Signals that the real operation has finished.
    ///
    /// Calling it again, or without an active run, has no effect. When the
    /// final window has zero length the callback fires before this returns.
    pub fn signal_real_completion(&self) {
        let now = Instant::now().into_std();
        let (outcome, percent) = {
            let mut guard = self.shared.lock_run();
            let Some(active) = guard.as_mut() else {
                tracing::debug!("completion signalled without an active run");
                return;
            };
            let outcome = active.run.request_completion(now);
            let snapshot = active.run.snapshot();
            if outcome != TickOutcome::Inert {
                self.shared.updates.send_replace(snapshot);
            }
            if outcome == TickOutcome::Completed {
                *guard = None;
            }
            (outcome, snapshot.percent)
        };

        match outcome {
            TickOutcome::Inert => {}
            TickOutcome::Running => {
                tracing::debug!(percent, "real completion signalled");
            }
            TickOutcome::Completed => {
                self.cancel_ticker();
                tracing::debug!("progress run completed on signal");
                (self.shared.on_complete)();
            }
        }
    }

    /// Cancels the ticker and discards the run without firing the callback.
    ///
    /// Safe to call repeatedly.
    pub fn stop(&self) {
        self.cancel_ticker();
        let abandoned = {
            let mut guard = self.shared.lock_run();
            let abandoned = guard.take().map(|mut active| {
                active.run.abandon();
                active.generation
            });
            if abandoned.is_some() {
                self.shared.updates.send_replace(ProgressSnapshot::abandoned());
            }
            abandoned
        };
        if let Some(generation) = abandoned {
            tracing::debug!(generation, "progress run abandoned");
        }
    }

    /// Returns the most recent snapshot.
    pub fn snapshot(&self) -> ProgressSnapshot {
        *self.shared.updates.borrow()
    }

    /// Returns true while a run is being simulated.
    pub fn is_active(&self) -> bool {
        self.shared.lock_run().is_some()
    }

    /// Subscribes to per-tick snapshots.
    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.shared.updates.subscribe()
    }

    /// Runs `work` under a fresh progress run.
    ///
    /// Completion is signalled once `work` finishes, whatever its output,
    /// and this returns after the run has reached a terminal state.
    pub async fn track<F>(&self, sequence: PhaseSequence, work: F) -> F::Output
    where
        F: Future,
    {
        let mut updates = self.subscribe();
        self.start(sequence);
        let output = work.await;
        self.signal_real_completion();
        if updates.wait_for(|s| s.state.is_terminal()).await.is_err() {
            tracing::warn!("progress updates closed before the run finished");
        }
        output
    }
}

impl Drop for ProgressEstimator {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}
