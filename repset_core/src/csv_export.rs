//! CSV export of workout history.
//!
//! History is flattened to one row per set. Exercises without sets still get
//! a row with empty set columns so they are not lost from the export.

use crate::{Result, Workout, WorkoutExercise};
use chrono::DateTime;
use std::path::Path;
use tempfile::NamedTempFile;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    workout_id: &'a str,
    started_at: String,
    ended_at: Option<String>,
    status: &'static str,
    exercise: &'a str,
    exercise_id: &'a str,
    set_number: Option<usize>,
    weight: &'a str,
    reps: &'a str,
    completed: Option<bool>,
}

fn rfc3339(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}

fn base_row<'a>(workout: &'a Workout, exercise: &'a WorkoutExercise) -> CsvRow<'a> {
    CsvRow {
        workout_id: &workout.id,
        started_at: rfc3339(workout.start_time),
        ended_at: workout.end_time.map(rfc3339),
        status: workout.status.as_str(),
        exercise: &exercise.name,
        exercise_id: &exercise.exercise_id,
        set_number: None,
        weight: "",
        reps: "",
        completed: None,
    }
}

fn rows(workout: &Workout) -> Vec<CsvRow<'_>> {
    let mut out = Vec::new();
    for exercise in &workout.exercises {
        if exercise.sets.is_empty() {
            out.push(base_row(workout, exercise));
            continue;
        }
        for (i, set) in exercise.sets.iter().enumerate() {
            out.push(CsvRow {
                set_number: Some(i + 1),
                weight: &set.weight,
                reps: &set.reps,
                completed: Some(set.completed),
                ..base_row(workout, exercise)
            });
        }
    }
    out
}

/// Write `history` to `csv_path`, replacing any previous export.
///
/// The file is written to a temp file in the same directory, synced, then
/// renamed into place. Returns the number of rows written.
pub fn export_history(history: &[Workout], csv_path: &Path) -> Result<usize> {
    let parent = match csv_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    let mut writer = csv::Writer::from_writer(temp.as_file());

    let mut count = 0;
    for workout in history {
        for row in rows(workout) {
            writer.serialize(row)?;
            count += 1;
        }
    }

    writer.flush()?;
    drop(writer);
    temp.as_file().sync_all()?;
    temp.persist(csv_path).map_err(|e| crate::Error::Io(e.error))?;

    tracing::info!("Exported {} rows to {:?}", count, csv_path);
    Ok(count)
}
