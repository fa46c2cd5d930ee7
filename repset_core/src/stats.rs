//! Derived numbers and display formatting for workouts.
//!
//! Set weights and reps are free text; they are parsed here, at read time,
//! and anything that doesn't parse to a positive number is skipped.

use crate::types::Workout;
use chrono::{DateTime, NaiveDate, TimeZone};

/// Parse a user-entered quantity such as `"80"`, `" 62.5 "` or `"62,5"`
pub fn parse_quantity(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().replace(',', ".").parse().ok()?;
    value.is_finite().then_some(value)
}

/// Epley estimate: `weight * (1 + reps / 30)`
pub fn epley(weight: f64, reps: f64) -> f64 {
    weight * (1.0 + reps / 30.0)
}

/// Best estimated one-rep max for exercises whose name contains `query`
/// (case-insensitive), rounded to one decimal.
///
/// Returns `None` when no set has a usable weight and rep count.
pub fn estimate_one_rep_max(history: &[Workout], query: &str) -> Option<f64> {
    let query = query.to_lowercase();

    history
        .iter()
        .flat_map(|w| w.exercises.iter())
        .filter(|e| e.name.to_lowercase().contains(&query))
        .flat_map(|e| e.sets.iter())
        .filter_map(|set| {
            let weight = parse_quantity(&set.weight)?;
            let reps = parse_quantity(&set.reps)?;
            (weight > 0.0 && reps > 0.0).then(|| epley(weight, reps))
        })
        .fold(None, |best: Option<f64>, e| Some(best.map_or(e, |b| b.max(e))))
        .map(|max| (max * 10.0).round() / 10.0)
}

/// Total trained minutes, each finished workout rounded to whole minutes
pub fn total_minutes(history: &[Workout]) -> i64 {
    history
        .iter()
        .filter_map(Workout::duration_ms)
        .map(|ms| (ms as f64 / 60_000.0).round() as i64)
        .sum()
}

/// `"N min"` for a finished workout, `"In Progress"` otherwise
pub fn format_duration(workout: &Workout) -> String {
    match workout.duration_ms() {
        Some(ms) => format!("{} min", ms / 60_000),
        None => "In Progress".to_string(),
    }
}

/// `HH:MM:SS`
pub fn format_hms(ms: i64) -> String {
    let total = ms.max(0) / 1_000;
    format!("{:02}:{:02}:{:02}", total / 3_600, (total % 3_600) / 60, total % 60)
}

/// `MM:SS`, for interval countdowns
pub fn format_countdown(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// `MM:SS.cc`, for the stopwatch
pub fn format_stopwatch(ms: i64) -> String {
    let ms = ms.max(0);
    format!(
        "{:02}:{:02}.{:02}",
        ms / 60_000,
        (ms % 60_000) / 1_000,
        (ms % 1_000) / 10
    )
}

/// Group workouts by calendar day of their start in `tz`, newest day first
/// and newest workout first within a day
pub fn group_by_day<'a, Tz: TimeZone>(
    history: &'a [Workout],
    tz: &Tz,
) -> Vec<(NaiveDate, Vec<&'a Workout>)> {
    let mut sorted: Vec<&Workout> = history.iter().collect();
    sorted.sort_by(|a, b| b.start_time.cmp(&a.start_time));

    let mut groups: Vec<(NaiveDate, Vec<&Workout>)> = Vec::new();
    for workout in sorted {
        let Some(utc) = DateTime::from_timestamp_millis(workout.start_time) else {
            tracing::warn!("Workout {} has an invalid start time", workout.id);
            continue;
        };
        let day = utc.with_timezone(tz).date_naive();
        match groups.last_mut() {
            Some((last_day, items)) if *last_day == day => items.push(workout),
            _ => groups.push((day, vec![workout])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{WorkoutExercise, WorkoutSet, WorkoutStatus};
    use chrono::Utc;

    fn set(weight: &str, reps: &str) -> WorkoutSet {
        WorkoutSet::new("s".into(), weight, reps)
    }

    fn workout(start: i64, end: Option<i64>, name: &str, sets: Vec<WorkoutSet>) -> Workout {
        Workout {
            id: format!("w{}", start),
            start_time: start,
            end_time: end,
            status: if end.is_some() {
                WorkoutStatus::Finished
            } else {
                WorkoutStatus::Active
            },
            exercises: vec![WorkoutExercise {
                id: "e".into(),
                exercise_id: "x".into(),
                name: name.into(),
                sets,
            }],
        }
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("80"), Some(80.0));
        assert_eq!(parse_quantity(" 62.5 "), Some(62.5));
        assert_eq!(parse_quantity("62,5"), Some(62.5));
        assert_eq!(parse_quantity(""), None);
        assert_eq!(parse_quantity("heavy"), None);
        assert_eq!(parse_quantity("inf"), None);
    }

    #[test]
    fn test_one_rep_max_uses_best_set() {
        let history = vec![
            workout(0, Some(1), "Barbell Bench Press", vec![set("100", "5"), set("80", "10")]),
            workout(2, Some(3), "Barbell Squat", vec![set("200", "5")]),
        ];
        // 100 * (1 + 5/30) = 116.67 ; 80 * (1 + 10/30) = 106.67
        assert_eq!(estimate_one_rep_max(&history, "bench"), Some(116.7));
    }

    #[test]
    fn test_one_rep_max_skips_unparseable_and_non_positive() {
        let history = vec![workout(
            0,
            Some(1),
            "Deadlift",
            vec![set("", "5"), set("abc", "3"), set("100", "0"), set("-20", "5")],
        )];
        assert_eq!(estimate_one_rep_max(&history, "deadlift"), None);
        assert_eq!(estimate_one_rep_max(&[], "deadlift"), None);
    }

    #[test]
    fn test_total_minutes_skips_unfinished() {
        let history = vec![
            workout(0, Some(30 * 60_000), "A", vec![]),
            workout(0, Some(90_000), "B", vec![]),
            workout(0, None, "C", vec![]),
        ];
        assert_eq!(total_minutes(&history), 32);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_hms(3_723_000), "01:02:03");
        assert_eq!(format_countdown(185), "03:05");
        assert_eq!(format_stopwatch(61_234), "01:01.23");
        assert_eq!(format_duration(&workout(0, Some(125_000), "A", vec![])), "2 min");
        assert_eq!(format_duration(&workout(0, None, "A", vec![])), "In Progress");
    }

    #[test]
    fn test_group_by_day_newest_first() {
        let day = 86_400_000;
        let history = vec![
            workout(day + 1_000, Some(day + 2_000), "A", vec![]),
            workout(3 * day, Some(3 * day + 1), "B", vec![]),
            workout(day + 5_000, Some(day + 6_000), "C", vec![]),
        ];
        let groups = group_by_day(&history, &Utc);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, NaiveDate::from_ymd_opt(1970, 1, 4).unwrap());
        assert_eq!(groups[1].1.len(), 2);
        assert_eq!(groups[1].1[0].start_time, day + 5_000);
    }
}
