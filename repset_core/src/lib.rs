#![forbid(unsafe_code)]

//! Core domain model and business logic for the Repset workout tracker.
//!
//! This crate provides:
//! - Domain types (workouts, exercises, sets, catalog entries)
//! - The exercise/set ledger and the session state machine
//! - History synchronization against a remote store
//! - Interval timer and stopwatch with scoped tick scheduling
//! - Local persistence, stats and CSV export
//! - Body weight and measurement logs

pub mod types;
pub mod error;
pub mod ids;
pub mod clock;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod ledger;
pub mod session;
pub mod remote;
pub mod sync;
pub mod timer;
pub mod ticker;
pub mod tracker;
pub mod state;
pub mod stats;
pub mod progress;
pub mod csv_export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, default_timer_templates, get_default_catalog};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::Config;
pub use ids::{IdGenerator, RandomIds, SequentialIds};
pub use remote::{HttpRemoteStore, MemoryRemoteStore, RemoteStore, StoredWorkout, WorkoutPayload};
pub use session::WorkoutSession;
pub use progress::{BodyMeasurement, ProgressLog, WeightLog};
pub use state::SessionStore;
pub use sync::{CommitHandle, HistorySync, SyncEvent, SyncReport};
pub use timer::{IntervalConfig, IntervalTimer, Phase, Stopwatch, Ticking};
pub use ticker::{TickHandle, TimerController};
pub use tracker::Tracker;
