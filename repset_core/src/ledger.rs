//! Exercise/set ledger of a workout.
//!
//! Every operation reads a snapshot and derives a complete new one. A stale
//! exercise or set id yields `None`, meaning "nothing changed": the caller
//! keeps the snapshot it already has.

use crate::ids::IdGenerator;
use crate::types::{SetUpdate, Workout, WorkoutExercise, WorkoutSet};

/// Append an exercise with one empty set
pub fn add_exercise(
    workout: &Workout,
    ids: &dyn IdGenerator,
    catalog_id: &str,
    name: &str,
) -> Workout {
    let exercise = WorkoutExercise {
        id: ids.next_id(),
        exercise_id: catalog_id.to_string(),
        name: name.to_string(),
        sets: vec![WorkoutSet::new(ids.next_id(), "", "")],
    };

    let mut next = workout.clone();
    next.exercises.push(exercise);
    next
}

pub fn remove_exercise(workout: &Workout, exercise_id: &str) -> Option<Workout> {
    let index = workout.exercises.iter().position(|e| e.id == exercise_id)?;
    let mut next = workout.clone();
    next.exercises.remove(index);
    Some(next)
}

/// Append a set, copying weight and reps forward from the current last set
pub fn add_set(workout: &Workout, ids: &dyn IdGenerator, exercise_id: &str) -> Option<Workout> {
    with_exercise(workout, exercise_id, |exercise| {
        let set = match exercise.sets.last() {
            Some(last) => WorkoutSet::new(ids.next_id(), last.weight.clone(), last.reps.clone()),
            None => WorkoutSet::new(ids.next_id(), "", ""),
        };
        exercise.sets.push(set);
        true
    })
}

/// Remove a set. An exercise may be left with no sets.
pub fn remove_set(workout: &Workout, exercise_id: &str, set_id: &str) -> Option<Workout> {
    with_exercise(workout, exercise_id, |exercise| {
        match exercise.sets.iter().position(|s| s.id == set_id) {
            Some(index) => {
                exercise.sets.remove(index);
                true
            }
            None => false,
        }
    })
}

/// Overwrite one field of a set.
///
/// Text is stored as given; completed sets are not locked here.
pub fn update_set(
    workout: &Workout,
    exercise_id: &str,
    set_id: &str,
    update: &SetUpdate,
) -> Option<Workout> {
    with_exercise(workout, exercise_id, |exercise| {
        match exercise.sets.iter_mut().find(|s| s.id == set_id) {
            Some(set) => {
                update.apply(set);
                true
            }
            None => false,
        }
    })
}

/// Clone the workout and run `f` on the named exercise; `f` reports whether
/// it changed anything.
fn with_exercise<F>(workout: &Workout, exercise_id: &str, f: F) -> Option<Workout>
where
    F: FnOnce(&mut WorkoutExercise) -> bool,
{
    let index = workout.exercises.iter().position(|e| e.id == exercise_id)?;
    let mut next = workout.clone();
    if f(&mut next.exercises[index]) {
        Some(next)
    } else {
        None
    }
}
