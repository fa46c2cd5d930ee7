//! Periodic tick scheduling.
//!
//! A [`TickHandle`] owns one periodic tokio task and aborts it when dropped.
//! [`TimerController`] keeps at most one handle per timer: it acquires a
//! handle when the timer starts running and drops it on pause, reset,
//! reconfigure and teardown, so two tickers can never drive the same timer.
//! Aborting cannot stop a tick that is already waiting on the timer lock, so
//! each tick also checks the controller's generation and stands down when a
//! newer one has taken over.

use crate::timer::{IntervalConfig, IntervalTimer, Ticking};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Shortest period a tick task will run at; `interval` rejects zero
const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

/// Scoped handle to a periodic task
#[derive(Debug)]
pub struct TickHandle {
    task: JoinHandle<()>,
}

impl TickHandle {
    /// Run `on_tick` every `period`, first after one full period, until it
    /// returns `Break` or the handle is dropped. Periods under a millisecond
    /// run at one millisecond.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let period = period.max(MIN_TICK_PERIOD);
        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                interval.tick().await;
                if on_tick().is_break() {
                    break;
                }
            }
        });
        Self { task }
    }

    /// Whether the task is still scheduled
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Drives a [`Ticking`] timer and publishes its snapshots
pub struct TimerController<T: Ticking> {
    timer: Arc<Mutex<T>>,
    ticker: Option<TickHandle>,
    updates: Arc<watch::Sender<T::Snapshot>>,
    generation: Arc<AtomicU64>,
}

fn lock<T>(timer: &Mutex<T>) -> MutexGuard<'_, T> {
    timer.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Ticking> TimerController<T> {
    pub fn new(timer: T) -> Self {
        let (updates, _) = watch::channel(timer.snapshot());
        Self {
            timer: Arc::new(Mutex::new(timer)),
            ticker: None,
            updates: Arc::new(updates),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Receive every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<T::Snapshot> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> T::Snapshot {
        lock(&self.timer).snapshot()
    }

    /// Whether a tick task is currently scheduled
    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(TickHandle::is_active)
    }

    /// Start or pause the timer
    pub fn toggle(&mut self) {
        let running = {
            let mut timer = lock(&self.timer);
            timer.toggle();
            self.updates.send_replace(timer.snapshot());
            timer.is_running()
        };

        if running {
            self.acquire();
        } else {
            self.release();
        }
    }

    /// Stop and return the timer to its initial state
    pub fn reset(&mut self) {
        self.release();
        let mut timer = lock(&self.timer);
        timer.reset();
        self.updates.send_replace(timer.snapshot());
    }

    fn acquire(&mut self) {
        self.release();

        let timer = Arc::clone(&self.timer);
        let updates = Arc::clone(&self.updates);
        let current = Arc::clone(&self.generation);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let period = lock(&self.timer).period();

        self.ticker = Some(TickHandle::spawn(period, move || {
            tick_if_current(&timer, &updates, &current, generation)
        }));
    }

    fn release(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if self.ticker.take().is_some() {
            tracing::trace!("Tick task released");
        }
    }
}

/// One tick on behalf of the task started at `generation`
fn tick_if_current<T: Ticking>(
    timer: &Mutex<T>,
    updates: &watch::Sender<T::Snapshot>,
    current: &AtomicU64,
    generation: u64,
) -> ControlFlow<()> {
    let mut timer = lock(timer);
    if current.load(Ordering::SeqCst) != generation {
        return ControlFlow::Break(());
    }
    timer.tick();
    updates.send_replace(timer.snapshot());
    if timer.is_running() {
        ControlFlow::Continue(())
    } else {
        ControlFlow::Break(())
    }
}

impl TimerController<IntervalTimer> {
    /// Replace the configuration; the timer ends up reset and paused
    pub fn reconfigure(&mut self, config: IntervalConfig) {
        self.release();
        let mut timer = lock(&self.timer);
        timer.reconfigure(config);
        self.updates.send_replace(timer.snapshot());
    }
}
