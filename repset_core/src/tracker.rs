//! The workout tracking service.
//!
//! [`Tracker`] is the one object front ends talk to. It owns the current
//! session, the synced history and the once-per-second elapsed-time sampler
//! that runs only while the session is active.

use crate::catalog::get_default_catalog;
use crate::clock::SharedClock;
use crate::ids::IdGenerator;
use crate::remote::RemoteStore;
use crate::session::WorkoutSession;
use crate::sync::{CommitHandle, HistorySync, SyncEvent, SyncReport};
use crate::ticker::TickHandle;
use crate::types::{SetUpdate, Workout, WorkoutStatus};
use crate::Result;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

const ELAPSED_SAMPLE_PERIOD: Duration = Duration::from_secs(1);

pub struct Tracker {
    session: WorkoutSession,
    history: HistorySync,
    elapsed: Arc<watch::Sender<Option<Duration>>>,
    sampler: Option<TickHandle>,
}

impl Tracker {
    pub fn new(
        clock: SharedClock,
        ids: Arc<dyn IdGenerator>,
        store: Arc<dyn RemoteStore>,
    ) -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (history, events) = HistorySync::new(store);
        (Self::assemble(WorkoutSession::new(clock, ids), history), events)
    }

    /// Rebuild a tracker from saved state.
    ///
    /// If the saved workout is active the elapsed sampler starts right away,
    /// so this must run inside a tokio runtime.
    pub fn restore(
        clock: SharedClock,
        ids: Arc<dyn IdGenerator>,
        store: Arc<dyn RemoteStore>,
        current: Option<Workout>,
        history: Vec<Workout>,
    ) -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (history, events) = HistorySync::with_cache(store, history);
        let mut tracker = Self::assemble(WorkoutSession::restore(clock, ids, current), history);
        tracker.refresh_sampler();
        (tracker, events)
    }

    fn assemble(session: WorkoutSession, history: HistorySync) -> Self {
        let (elapsed, _) = watch::channel(None);
        Self {
            session,
            history,
            elapsed: Arc::new(elapsed),
            sampler: None,
        }
    }

    pub fn current(&self) -> Option<Arc<Workout>> {
        self.session.current()
    }

    pub fn history(&self) -> &[Workout] {
        self.history.history()
    }

    pub fn pending(&self) -> Vec<Workout> {
        self.history.pending()
    }

    /// Elapsed time of the active session, sampled once per second.
    ///
    /// `None` whenever no session is active.
    pub fn elapsed(&self) -> watch::Receiver<Option<Duration>> {
        self.elapsed.subscribe()
    }

    /// Whether the elapsed sampler is scheduled
    pub fn is_sampling(&self) -> bool {
        self.sampler.as_ref().is_some_and(TickHandle::is_active)
    }

    pub fn start(&mut self) -> Arc<Workout> {
        self.session.start()
    }

    /// Start the session clock. Needs a tokio runtime for the sampler.
    pub fn start_clock(&mut self) -> bool {
        let started = self.session.start_clock();
        if started {
            self.refresh_sampler();
        }
        started
    }

    /// End the session and hand it to history.
    ///
    /// Returns the upload handle, or `None` without a current session.
    pub fn finish(&mut self) -> Option<CommitHandle> {
        let finished = self.session.finish()?;
        self.refresh_sampler();
        Some(self.history.commit(finished))
    }

    pub async fn load_history(&mut self) -> bool {
        self.history.load().await
    }

    pub fn retry_pending(&mut self) -> Vec<CommitHandle> {
        self.history.retry_pending()
    }

    /// Upload whatever the remote store is missing, then reload from it
    pub async fn sync(&mut self) -> Result<SyncReport> {
        self.history.sync().await
    }

    pub fn add_exercise(&mut self, catalog_id: &str, name: &str) -> Option<String> {
        self.session.add_exercise(catalog_id, name)
    }

    /// Add an exercise by catalog id, copying its name from the default catalog
    pub fn add_catalog_exercise(&mut self, catalog_id: &str) -> Option<String> {
        let Some(def) = get_default_catalog().get(catalog_id) else {
            tracing::debug!("Unknown catalog exercise {}", catalog_id);
            return None;
        };
        self.session.add_exercise(&def.id, &def.name)
    }

    pub fn remove_exercise(&mut self, exercise_id: &str) -> bool {
        self.session.remove_exercise(exercise_id)
    }

    pub fn add_set(&mut self, exercise_id: &str) -> bool {
        self.session.add_set(exercise_id)
    }

    pub fn remove_set(&mut self, exercise_id: &str, set_id: &str) -> bool {
        self.session.remove_set(exercise_id, set_id)
    }

    pub fn update_set(&mut self, exercise_id: &str, set_id: &str, update: SetUpdate) -> bool {
        self.session.update_set(exercise_id, set_id, update)
    }

    /// Run the sampler iff the session is active
    fn refresh_sampler(&mut self) {
        // Dropping the old handle aborts it before a new one exists.
        self.sampler = None;

        let active_since = self
            .session
            .current()
            .filter(|w| w.status == WorkoutStatus::Active)
            .map(|w| w.start_time);

        let Some(start_time) = active_since else {
            self.elapsed.send_replace(None);
            return;
        };

        let clock = Arc::clone(self.session.clock());
        let sample = move || {
            let ms = (clock.now_ms() - start_time).max(0);
            Some(Duration::from_millis(ms as u64))
        };
        self.elapsed.send_replace(sample());

        let elapsed = Arc::clone(&self.elapsed);
        self.sampler = Some(TickHandle::spawn(ELAPSED_SAMPLE_PERIOD, move || {
            elapsed.send_replace(sample());
            ControlFlow::Continue(())
        }));
    }
}
