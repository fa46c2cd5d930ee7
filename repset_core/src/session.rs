//! Session lifecycle state machine.
//!
//! ```text
//! Idle --start--> Preparing --start_clock--> Active --finish--> Idle
//!                     \_____________finish_____________/
//! ```
//!
//! At most one workout is current. The current workout is held as an
//! `Arc<Workout>` snapshot that is replaced wholesale on every change, so a
//! reader holding a snapshot never sees a half-applied mutation.

use crate::clock::SharedClock;
use crate::ids::IdGenerator;
use crate::ledger;
use crate::types::{SetUpdate, Workout, WorkoutStatus};
use std::sync::Arc;

pub struct WorkoutSession {
    current: Option<Arc<Workout>>,
    clock: SharedClock,
    ids: Arc<dyn IdGenerator>,
}

impl WorkoutSession {
    pub fn new(clock: SharedClock, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            current: None,
            clock,
            ids,
        }
    }

    /// Resume from a previously saved current workout.
    ///
    /// A saved workout that is already finished belongs in history, not in
    /// the slot, and is dropped.
    pub fn restore(clock: SharedClock, ids: Arc<dyn IdGenerator>, saved: Option<Workout>) -> Self {
        let current = match saved {
            Some(w) if w.is_finished() => {
                tracing::warn!("Ignoring finished workout {} found in session slot", w.id);
                None
            }
            Some(w) => Some(Arc::new(w)),
            None => None,
        };
        Self {
            current,
            clock,
            ids,
        }
    }

    /// Snapshot of the current workout
    pub fn current(&self) -> Option<Arc<Workout>> {
        self.current.clone()
    }

    pub fn status(&self) -> Option<WorkoutStatus> {
        self.current.as_ref().map(|w| w.status)
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Begin a workout in the preparing state.
    ///
    /// If a workout is already current it is returned unchanged.
    pub fn start(&mut self) -> Arc<Workout> {
        if let Some(existing) = &self.current {
            tracing::debug!("start ignored: workout {} already current", existing.id);
            return existing.clone();
        }

        let workout = Arc::new(Workout::preparing(self.ids.next_id(), self.clock.now_ms()));
        tracing::info!("Started workout {}", workout.id);
        self.current = Some(workout.clone());
        workout
    }

    /// Start the clock: `preparing -> active`, restarting `start_time` now.
    ///
    /// Returns false (and changes nothing) unless the workout is preparing.
    pub fn start_clock(&mut self) -> bool {
        let Some(current) = &self.current else {
            tracing::debug!("start_clock ignored: no current workout");
            return false;
        };
        if current.status != WorkoutStatus::Preparing {
            tracing::debug!(
                "start_clock ignored: workout {} is {}",
                current.id,
                current.status
            );
            return false;
        }

        let mut next = Workout::clone(current);
        next.status = WorkoutStatus::Active;
        next.start_time = self.clock.now_ms();
        tracing::info!("Clock started for workout {}", next.id);
        self.current = Some(Arc::new(next));
        true
    }

    /// End the current workout and empty the slot.
    ///
    /// Returns the finished record, or `None` when there was no workout.
    pub fn finish(&mut self) -> Option<Workout> {
        let current = self.current.take()?;
        let mut finished = Workout::clone(&current);
        // Never before start_time, even if the wall clock stepped back.
        finished.end_time = Some(self.clock.now_ms().max(finished.start_time));
        finished.status = WorkoutStatus::Finished;

        tracing::info!(
            "Finished workout {} ({} exercises, {} sets)",
            finished.id,
            finished.exercises.len(),
            finished.set_count()
        );
        Some(finished)
    }

    /// Milliseconds since the clock started, only while active
    pub fn elapsed_ms(&self) -> Option<i64> {
        self.current
            .as_ref()
            .filter(|w| w.status == WorkoutStatus::Active)
            .map(|w| (self.clock.now_ms() - w.start_time).max(0))
    }

    pub fn add_exercise(&mut self, catalog_id: &str, name: &str) -> Option<String> {
        let ids = self.ids.clone();
        let mut added = None;
        self.apply("add_exercise", |w| {
            let next = ledger::add_exercise(w, ids.as_ref(), catalog_id, name);
            added = next.exercises.last().map(|e| e.id.clone());
            Some(next)
        });
        added
    }

    pub fn remove_exercise(&mut self, exercise_id: &str) -> bool {
        self.apply("remove_exercise", |w| ledger::remove_exercise(w, exercise_id))
    }

    pub fn add_set(&mut self, exercise_id: &str) -> bool {
        let ids = self.ids.clone();
        self.apply("add_set", |w| ledger::add_set(w, ids.as_ref(), exercise_id))
    }

    pub fn remove_set(&mut self, exercise_id: &str, set_id: &str) -> bool {
        self.apply("remove_set", |w| ledger::remove_set(w, exercise_id, set_id))
    }

    pub fn update_set(&mut self, exercise_id: &str, set_id: &str, update: SetUpdate) -> bool {
        self.apply("update_set", |w| {
            ledger::update_set(w, exercise_id, set_id, &update)
        })
    }

    /// Swap in the snapshot produced by `op`, if any
    fn apply<F>(&mut self, op_name: &str, op: F) -> bool
    where
        F: FnOnce(&Workout) -> Option<Workout>,
    {
        let Some(current) = &self.current else {
            tracing::debug!("{} ignored: no current workout", op_name);
            return false;
        };

        match op(current) {
            Some(next) => {
                self.current = Some(Arc::new(next));
                true
            }
            None => {
                tracing::debug!("{} ignored: target not found", op_name);
                false
            }
        }
    }
}
