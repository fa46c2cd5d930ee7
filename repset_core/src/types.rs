//! Core domain types for the Repset system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Workouts (sessions) and their exercise/set ledger
//! - Set mutations
//! - Catalog exercise definitions
//! - Interval timer templates

use serde::{Deserialize, Serialize};

// ============================================================================
// Session Types
// ============================================================================

/// Lifecycle status of a workout
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutStatus {
    /// Created, clock not started yet
    Preparing,
    /// Clock running
    Active,
    /// Ended and handed over to history
    Finished,
}

impl WorkoutStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkoutStatus::Preparing => "preparing",
            WorkoutStatus::Active => "active",
            WorkoutStatus::Finished => "finished",
        }
    }
}

impl std::fmt::Display for WorkoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single set within an exercise.
///
/// `weight` and `reps` hold whatever the user typed. They are parsed only by
/// readers that compute something from them (see [`crate::stats`]).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkoutSet {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub reps: String,
    #[serde(default)]
    pub completed: bool,
}

impl WorkoutSet {
    /// A fresh, not yet completed set
    pub fn new(id: String, weight: impl Into<String>, reps: impl Into<String>) -> Self {
        Self {
            id,
            weight: weight.into(),
            reps: reps.into(),
            completed: false,
        }
    }
}

/// An exercise performed within a workout.
///
/// `id` identifies this instance inside the session; `exercise_id` points
/// into the catalog. `name` is copied at add-time.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutExercise {
    pub id: String,
    pub exercise_id: String,
    pub name: String,
    #[serde(default)]
    pub sets: Vec<WorkoutSet>,
}

impl WorkoutExercise {
    pub fn find_set(&self, set_id: &str) -> Option<&WorkoutSet> {
        self.sets.iter().find(|s| s.id == set_id)
    }
}

/// A workout session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    /// Epoch milliseconds
    pub start_time: i64,
    /// Epoch milliseconds, present iff the workout is finished
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    pub status: WorkoutStatus,
    #[serde(default)]
    pub exercises: Vec<WorkoutExercise>,
}

impl Workout {
    /// A new workout in the preparing state
    pub fn preparing(id: String, start_time: i64) -> Self {
        Self {
            id,
            start_time,
            end_time: None,
            status: WorkoutStatus::Preparing,
            exercises: Vec::new(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status == WorkoutStatus::Finished
    }

    /// Duration in milliseconds, `None` while still in progress
    pub fn duration_ms(&self) -> Option<i64> {
        self.end_time.map(|end| (end - self.start_time).max(0))
    }

    pub fn find_exercise(&self, exercise_id: &str) -> Option<&WorkoutExercise> {
        self.exercises.iter().find(|e| e.id == exercise_id)
    }

    /// Total number of sets across all exercises
    pub fn set_count(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }
}

/// A mutation of one field of a set
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SetUpdate {
    Weight(String),
    Reps(String),
    Completed(bool),
}

impl SetUpdate {
    pub(crate) fn apply(&self, set: &mut WorkoutSet) {
        match self {
            SetUpdate::Weight(w) => set.weight = w.clone(),
            SetUpdate::Reps(r) => set.reps = r.clone(),
            SetUpdate::Completed(c) => set.completed = *c,
        }
    }
}

// ============================================================================
// Catalog Types
// ============================================================================

/// Catalog grouping of an exercise
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ExerciseCategory {
    Chest,
    Back,
    Legs,
    Shoulders,
    Arms,
    Core,
    Cardio,
}

impl std::str::FromStr for ExerciseCategory {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chest" => Ok(ExerciseCategory::Chest),
            "back" => Ok(ExerciseCategory::Back),
            "legs" => Ok(ExerciseCategory::Legs),
            "shoulders" => Ok(ExerciseCategory::Shoulders),
            "arms" => Ok(ExerciseCategory::Arms),
            "core" => Ok(ExerciseCategory::Core),
            "cardio" => Ok(ExerciseCategory::Cardio),
            other => Err(crate::Error::Other(format!(
                "Unknown exercise category: {}",
                other
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// A read-only catalog exercise definition
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExerciseDefinition {
    pub id: String,
    pub name: String,
    pub muscle: String,
    pub category: ExerciseCategory,
    pub difficulty: Difficulty,
    /// How to perform the movement
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub primary_muscles: Vec<String>,
    #[serde(default)]
    pub secondary_muscles: Vec<String>,
}

/// The static catalog of exercise definitions, in display order
#[derive(Clone, Debug)]
pub struct Catalog {
    pub exercises: Vec<ExerciseDefinition>,
}

// ============================================================================
// Timer Types
// ============================================================================

/// A named interval timer preset
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimerTemplate {
    pub id: String,
    pub name: String,
    /// Work seconds per round
    pub work: u32,
    /// Rest seconds per round, 0 to skip rest entirely
    pub rest: u32,
    pub rounds: u32,
}
