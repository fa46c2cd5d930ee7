//! Optimistic history synchronization.
//!
//! A finished workout is put at the front of the local history at once, then
//! sent to the remote store in the background. The local entry stays whether
//! or not the upload works; a failed upload raises a [`SyncEvent::Warning`]
//! and parks the record in an in-memory retry queue. [`HistorySync::sync`]
//! reconciles a restored cache with the store, so an upload that failed in
//! an earlier process is sent again before the remote list replaces it.

use crate::remote::{RemoteStore, StoredWorkout, WorkoutPayload};
use crate::types::Workout;
use crate::{Error, Result};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Notifications about background sync work
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncEvent {
    /// A workout reached the remote store
    Saved {
        workout_id: String,
        server_id: String,
    },
    /// A workout could not be saved; it is still in the local history
    Warning { workout_id: String, message: String },
}

/// Counts from one [`HistorySync::sync`] pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Local workouts the remote store did not have and now does
    pub uploaded: usize,
    /// Local workouts still missing from the remote store
    pub failed: usize,
    /// Size of the merged history
    pub total: usize,
}

/// Outcome of one background upload
pub struct CommitHandle {
    workout_id: String,
    task: JoinHandle<Result<StoredWorkout>>,
}

impl CommitHandle {
    pub fn workout_id(&self) -> &str {
        &self.workout_id
    }

    /// Wait for the upload to finish.
    ///
    /// Dropping the handle instead leaves the upload running.
    pub async fn outcome(self) -> Result<StoredWorkout> {
        self.task
            .await
            .map_err(|e| Error::Other(format!("Sync task failed: {}", e)))?
    }
}

pub struct HistorySync {
    store: Arc<dyn RemoteStore>,
    cache: Vec<Workout>,
    pending: Arc<Mutex<Vec<Workout>>>,
    events: mpsc::UnboundedSender<SyncEvent>,
}

impl HistorySync {
    /// Create a sync layer with an empty cache.
    ///
    /// The receiver yields a [`SyncEvent`] for every finished upload.
    pub fn new(store: Arc<dyn RemoteStore>) -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        Self::with_cache(store, Vec::new())
    }

    /// Create a sync layer seeded with a previously saved cache
    pub fn with_cache(
        store: Arc<dyn RemoteStore>,
        cache: Vec<Workout>,
    ) -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let sync = Self {
            store,
            cache,
            pending: Arc::new(Mutex::new(Vec::new())),
            events,
        };
        (sync, rx)
    }

    /// Local history, newest first
    pub fn history(&self) -> &[Workout] {
        &self.cache
    }

    /// Workouts whose upload failed and has not been retried successfully
    pub fn pending(&self) -> Vec<Workout> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the local history with the remote one.
    ///
    /// On failure the error is logged and the cache is left as it was.
    /// Returns whether the cache was replaced.
    pub async fn load(&mut self) -> bool {
        match self.store.list().await {
            Ok(records) => {
                let mut history: Vec<Workout> =
                    records.into_iter().map(StoredWorkout::into_workout).collect();
                history.sort_by(|a, b| b.start_time.cmp(&a.start_time));
                tracing::info!("Loaded {} workouts from remote store", history.len());
                self.cache = history;
                true
            }
            Err(e) => {
                tracing::warn!("Failed to fetch history: {}. Keeping local cache.", e);
                false
            }
        }
    }

    /// Push local workouts the remote store is missing, then reload.
    ///
    /// A local entry counts as known when its id matches a remote record's
    /// `clientId` (or its server id, for records created without one). Every
    /// other entry is uploaded; the store deduplicates on `clientId`, so a
    /// resend is harmless. Entries whose upload fails stay in the merged
    /// history. When the first listing fails the cache is left untouched.
    pub async fn sync(&mut self) -> Result<SyncReport> {
        let remote = self.store.list().await?;
        let known: HashSet<String> = remote
            .iter()
            .map(|r| {
                r.payload
                    .client_id
                    .clone()
                    .unwrap_or_else(|| r.server_id.clone())
            })
            .collect();
        let missing: Vec<Workout> = self
            .cache
            .iter()
            .filter(|w| !known.contains(&w.id))
            .cloned()
            .collect();

        let mut report = SyncReport::default();
        let mut unsynced = Vec::new();
        for workout in missing {
            let event = match self.store.create(WorkoutPayload::from(&workout)).await {
                Ok(stored) => {
                    report.uploaded += 1;
                    SyncEvent::Saved {
                        workout_id: workout.id.clone(),
                        server_id: stored.server_id,
                    }
                }
                Err(e) => {
                    tracing::warn!("Could not upload workout {}: {}", workout.id, e);
                    report.failed += 1;
                    let event = SyncEvent::Warning {
                        workout_id: workout.id.clone(),
                        message: e.to_string(),
                    };
                    unsynced.push(workout);
                    event
                }
            };
            let _ = self.events.send(event);
        }

        let records = if report.uploaded > 0 {
            self.store.list().await?
        } else {
            remote
        };
        let mut history: Vec<Workout> = records
            .into_iter()
            .map(StoredWorkout::into_workout)
            .collect();
        let stored: HashSet<&str> = history.iter().map(|w| w.id.as_str()).collect();
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|w| !stored.contains(w.id.as_str()));

        history.extend(unsynced);
        history.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        self.cache = history;
        tracing::info!(
            "Synced history: {} uploaded, {} failed, {} total",
            report.uploaded,
            report.failed,
            self.cache.len()
        );
        report.total = self.cache.len();
        Ok(report)
    }

    /// Record a finished workout.
    ///
    /// The workout is at the front of [`history`](Self::history) when this
    /// returns; the upload runs on a spawned task. Must be called from within
    /// a tokio runtime.
    pub fn commit(&mut self, workout: Workout) -> CommitHandle {
        self.cache.insert(0, workout.clone());
        self.spawn_upload(workout)
    }

    /// Upload every parked workout again
    pub fn retry_pending(&mut self) -> Vec<CommitHandle> {
        let parked: Vec<Workout> = std::mem::take(
            &mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner),
        );
        if !parked.is_empty() {
            tracing::info!("Retrying {} unsynced workouts", parked.len());
        }
        parked.into_iter().map(|w| self.spawn_upload(w)).collect()
    }

    fn spawn_upload(&self, workout: Workout) -> CommitHandle {
        let store = Arc::clone(&self.store);
        let pending = Arc::clone(&self.pending);
        let events = self.events.clone();
        let workout_id = workout.id.clone();

        let task = tokio::spawn(async move {
            let result = store.create(WorkoutPayload::from(&workout)).await;
            // The session that produced this workout may be long gone; only
            // the queue and the event channel are touched here.
            let event = match &result {
                Ok(stored) => {
                    tracing::debug!("Synced workout {} as {}", workout.id, stored.server_id);
                    SyncEvent::Saved {
                        workout_id: workout.id.clone(),
                        server_id: stored.server_id.clone(),
                    }
                }
                Err(e) => {
                    tracing::warn!("Could not save workout {} to backend: {}", workout.id, e);
                    let message = e.to_string();
                    if e.is_retryable() {
                        pending
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push(workout.clone());
                    }
                    SyncEvent::Warning {
                        workout_id: workout.id.clone(),
                        message,
                    }
                }
            };
            // Nobody listening is fine.
            let _ = events.send(event);
            result
        });

        CommitHandle { workout_id, task }
    }
}
