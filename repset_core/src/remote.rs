//! Remote workout store.
//!
//! The store is create-and-list only: `GET /api/workouts` returns every
//! record newest first, `POST /api/workouts` creates one record and answers
//! `201` with it (plus a server `_id`) or `400 {"error": ...}`.

use crate::ids::{IdGenerator, RandomIds};
use crate::types::{Workout, WorkoutExercise, WorkoutStatus};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

const BODY_PREVIEW_LIMIT: usize = 256;

/// Body of a create request
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPayload {
    /// Client-side workout id, used by stores to spot duplicate submissions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub start_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(default)]
    pub exercises: Vec<WorkoutExercise>,
    #[serde(default = "default_status")]
    pub status: WorkoutStatus,
}

fn default_status() -> WorkoutStatus {
    WorkoutStatus::Finished
}

impl From<&Workout> for WorkoutPayload {
    fn from(workout: &Workout) -> Self {
        Self {
            client_id: Some(workout.id.clone()),
            start_time: workout.start_time,
            end_time: workout.end_time,
            exercises: workout.exercises.clone(),
            status: workout.status,
        }
    }
}

impl WorkoutPayload {
    /// Check the record before persisting it
    pub fn validate(&self) -> Result<()> {
        if self.start_time < 0 {
            return Err(Error::Validation("startTime must not be negative".into()));
        }
        if let Some(end) = self.end_time {
            if end < self.start_time {
                return Err(Error::Validation("endTime precedes startTime".into()));
            }
        }
        if self.status == WorkoutStatus::Preparing {
            return Err(Error::Validation(
                "status must be one of: active, finished".into(),
            ));
        }
        Ok(())
    }
}

/// A record as persisted by the store
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredWorkout {
    #[serde(rename = "_id")]
    pub server_id: String,
    #[serde(flatten)]
    pub payload: WorkoutPayload,
}

impl StoredWorkout {
    /// Convert to a local workout, keeping the client id when there is one
    pub fn into_workout(self) -> Workout {
        let StoredWorkout {
            server_id,
            payload,
        } = self;
        Workout {
            id: payload.client_id.unwrap_or(server_id),
            start_time: payload.start_time,
            end_time: payload.end_time,
            status: payload.status,
            exercises: payload.exercises,
        }
    }
}

/// Persistence endpoint for finished workouts
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All records, newest `start_time` first
    async fn list(&self) -> Result<Vec<StoredWorkout>>;

    /// Persist one record. Create-only: no update or merge.
    async fn create(&self, payload: WorkoutPayload) -> Result<StoredWorkout>;
}

// ============================================================================
// HTTP store
// ============================================================================

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// REST client for the workouts endpoint
#[derive(Clone, Debug)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    url: String,
}

impl HttpRemoteStore {
    /// `url` is the full collection URL, e.g. `http://localhost:5000/api/workouts`
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        let url = url.into().trim_end_matches('/').to_string();
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    let mut out: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();
    if trimmed.chars().count() > BODY_PREVIEW_LIMIT {
        out.push_str("...");
    }
    out
}

/// Turn a non-success response into the matching error
async fn status_error(resp: reqwest::Response) -> Error {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();

    if status == 400 {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or_else(|_| preview_body(&body));
        return Error::Validation(message);
    }

    Error::Remote {
        status,
        message: preview_body(&body),
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn list(&self) -> Result<Vec<StoredWorkout>> {
        let resp = self.client.get(&self.url).send().await?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        let records: Vec<StoredWorkout> = resp.json().await?;
        tracing::debug!("Fetched {} workouts from {}", records.len(), self.url);
        Ok(records)
    }

    async fn create(&self, payload: WorkoutPayload) -> Result<StoredWorkout> {
        let resp = self.client.post(&self.url).json(&payload).send().await?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        let stored: StoredWorkout = resp.json().await?;
        tracing::debug!("Created workout {} at {}", stored.server_id, self.url);
        Ok(stored)
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Store kept in process memory.
///
/// Backs the bundled server and doubles as a fake in tests: `set_offline`
/// makes every call fail with a connectivity error.
#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    records: Mutex<Vec<StoredWorkout>>,
    offline: AtomicBool,
    ids: RandomIds,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Connectivity("store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn list(&self) -> Result<Vec<StoredWorkout>> {
        self.check_online()?;
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        records.sort_by(|a, b| b.payload.start_time.cmp(&a.payload.start_time));
        Ok(records)
    }

    async fn create(&self, payload: WorkoutPayload) -> Result<StoredWorkout> {
        self.check_online()?;
        payload.validate()?;

        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);

        // A resubmitted client id gets the record created the first time.
        if let Some(client_id) = &payload.client_id {
            if let Some(existing) = records
                .iter()
                .find(|r| r.payload.client_id.as_ref() == Some(client_id))
            {
                tracing::info!("Duplicate submission of workout {}", client_id);
                return Ok(existing.clone());
            }
        }

        let stored = StoredWorkout {
            server_id: self.ids.next_id(),
            payload,
        };
        records.push(stored.clone());
        Ok(stored)
    }
}
