//! REST backend for workout history.
//!
//! Serves `GET /api/workouts` and `POST /api/workouts` over any
//! [`RemoteStore`]; the binary uses the in-process [`MemoryRemoteStore`].
//!
//! [`MemoryRemoteStore`]: repset_core::MemoryRemoteStore

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use repset_core::{Error, RemoteStore, StoredWorkout, WorkoutPayload};
use serde_json::json;
use std::sync::Arc;

pub const WORKOUTS_PATH: &str = "/api/workouts";

type SharedStore = Arc<dyn RemoteStore>;

/// Build the application router
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route(WORKOUTS_PATH, get(list_workouts).post(create_workout))
        .with_state(store)
}

/// Serve the API on `listener` until `shutdown` resolves
pub async fn serve<F>(
    listener: tokio::net::TcpListener,
    store: SharedStore,
    shutdown: F,
) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn list_workouts(
    State(store): State<SharedStore>,
) -> Result<Json<Vec<StoredWorkout>>, ApiError> {
    let records = store.list().await?;
    Ok(Json(records))
}

async fn create_workout(
    State(store): State<SharedStore>,
    payload: Result<Json<WorkoutPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<StoredWorkout>), ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError(Error::Validation(e.body_text())))?;
    let stored = store.create(payload).await?;
    tracing::info!("Stored workout {}", stored.server_id);
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Maps store errors to `{"error": ...}` responses
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Connectivity(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match self.0 {
            Error::Validation(msg) => msg,
            other => {
                tracing::error!("Request failed: {}", other);
                other.to_string()
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
