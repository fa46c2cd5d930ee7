//! End-to-end tests for the workouts API over a real socket.

use repset_core::remote::HttpRemoteStore;
use repset_core::types::{WorkoutExercise, WorkoutSet};
use repset_core::{
    Error, HistorySync, MemoryRemoteStore, RemoteStore, Workout, WorkoutPayload, WorkoutStatus,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Start a server on an ephemeral port and return its workouts URL
async fn spawn_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let store = Arc::new(MemoryRemoteStore::new());
    tokio::spawn(repset_server::serve(
        listener,
        store,
        std::future::pending::<()>(),
    ));
    format!("http://{}{}", addr, repset_server::WORKOUTS_PATH)
}

fn workout(id: &str, start_time: i64) -> Workout {
    Workout {
        id: id.into(),
        start_time,
        end_time: Some(start_time + 30 * 60_000),
        status: WorkoutStatus::Finished,
        exercises: vec![WorkoutExercise {
            id: format!("{}-ex", id),
            exercise_id: "legs_squat".into(),
            name: "Barbell Squat".into(),
            sets: vec![WorkoutSet::new(format!("{}-s1", id), "140", "5")],
        }],
    }
}

fn client(url: &str) -> HttpRemoteStore {
    HttpRemoteStore::new(url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_create_then_list_newest_first() {
    let url = spawn_server().await;
    let store = client(&url);

    let created = store
        .create(WorkoutPayload::from(&workout("old", 1_000)))
        .await
        .unwrap();
    assert!(!created.server_id.is_empty());
    store
        .create(WorkoutPayload::from(&workout("new", 2_000)))
        .await
        .unwrap();

    let records = store.list().await.unwrap();
    let ids: Vec<_> = records
        .iter()
        .map(|r| r.payload.client_id.as_deref().unwrap())
        .collect();
    assert_eq!(ids, vec!["new", "old"]);
}

#[tokio::test]
async fn test_history_round_trip_through_server() {
    let url = spawn_server().await;
    let original = workout("w1", 1_700_000_000_000);

    let (mut writer, _events) = HistorySync::new(Arc::new(client(&url)));
    writer.commit(original.clone()).outcome().await.unwrap();

    let (mut reader, _events) = HistorySync::new(Arc::new(client(&url)));
    assert!(reader.load().await);
    assert_eq!(reader.history(), &[original]);
}

#[tokio::test]
async fn test_resubmitted_client_id_is_stored_once() {
    let url = spawn_server().await;
    let store = client(&url);
    let payload = WorkoutPayload::from(&workout("w1", 1_000));

    let first = store.create(payload.clone()).await.unwrap();
    let second = store.create(payload).await.unwrap();
    assert_eq!(first.server_id, second.server_id);
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_start_time_is_bad_request() {
    let url = spawn_server().await;

    let response = reqwest::Client::new()
        .post(&url)
        .json(&json!({ "exercises": [], "status": "finished" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("startTime"));
}

#[tokio::test]
async fn test_invalid_record_maps_to_validation_error() {
    let url = spawn_server().await;
    let mut bad = workout("w1", 5_000);
    bad.end_time = Some(1_000);

    let err = client(&url)
        .create(WorkoutPayload::from(&bad))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(msg) if msg.contains("endTime")));
}

#[tokio::test]
async fn test_created_record_carries_server_id() {
    let url = spawn_server().await;

    let response = reqwest::Client::new()
        .post(&url)
        .json(&json!({
            "startTime": 1_000,
            "endTime": 2_000,
            "exercises": [],
            "status": "finished"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.unwrap();
    assert!(body["_id"].is_string());
    assert_eq!(body["startTime"], 1_000);
}
