//! Body weight and body measurement logs.
//!
//! Both logs are local only; they are never sent to the remote store.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// One body-weight reading
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightLog {
    pub id: String,
    /// Epoch milliseconds
    pub date: i64,
    pub weight: f64,
}

/// One set of tape measurements, kept as entered
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyMeasurement {
    pub id: String,
    pub date: i64,
    #[serde(default)]
    pub chest: String,
    #[serde(default)]
    pub waist: String,
    #[serde(default)]
    pub arms: String,
    #[serde(default)]
    pub legs: String,
}

impl BodyMeasurement {
    fn is_blank(&self) -> bool {
        [&self.chest, &self.waist, &self.arms, &self.legs]
            .iter()
            .all(|v| v.trim().is_empty())
    }
}

/// Weight and measurement history, each ordered oldest first
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressLog {
    #[serde(default)]
    pub weight_logs: Vec<WeightLog>,
    #[serde(default)]
    pub measurements: Vec<BodyMeasurement>,
}

impl ProgressLog {
    /// Record a weight reading, keeping the log sorted by date
    pub fn log_weight(&mut self, id: String, date: i64, weight: f64) -> Result<()> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(Error::Validation(format!(
                "Weight must be a positive number, got {}",
                weight
            )));
        }
        self.weight_logs.push(WeightLog { id, date, weight });
        // Stable, so readings on the same date keep entry order.
        self.weight_logs.sort_by_key(|log| log.date);
        Ok(())
    }

    /// Most recent weight reading
    pub fn latest_weight(&self) -> Option<f64> {
        self.weight_logs.last().map(|log| log.weight)
    }

    /// Latest reading minus the earliest one
    pub fn weight_change(&self) -> Option<f64> {
        match (self.weight_logs.first(), self.weight_logs.last()) {
            (Some(first), Some(last)) if self.weight_logs.len() > 1 => {
                Some(last.weight - first.weight)
            }
            _ => None,
        }
    }

    /// Record measurements; at least one field must be filled in
    pub fn log_measurement(&mut self, measurement: BodyMeasurement) -> Result<()> {
        if measurement.is_blank() {
            return Err(Error::Validation(
                "Pass at least one of chest, waist, arms or legs".into(),
            ));
        }
        self.measurements.push(measurement);
        self.measurements.sort_by_key(|m| m.date);
        Ok(())
    }

    pub fn latest_measurement(&self) -> Option<&BodyMeasurement> {
        self.measurements.last()
    }
}
