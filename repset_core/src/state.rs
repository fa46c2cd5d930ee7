//! Local state persistence with file locking.
//!
//! The CLI runs one process per command, so the current session, the
//! local history cache and the progress log live in JSON files under the
//! data directory between invocations.

use crate::progress::ProgressLog;
use crate::{Error, Result, Workout};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const SESSION_FILE: &str = "session.json";
const HISTORY_FILE: &str = "history.json";
const PROGRESS_FILE: &str = "progress.json";

/// Files holding the current session and the history cache
#[derive(Clone, Debug)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    pub fn history_path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILE)
    }

    pub fn progress_path(&self) -> PathBuf {
        self.dir.join(PROGRESS_FILE)
    }

    /// The saved current workout, if any
    pub fn load_session(&self) -> Result<Option<Workout>> {
        load_or_default(&self.session_path())
    }

    /// Save the current workout, or remove the file when there is none
    pub fn save_session(&self, workout: Option<&Workout>) -> Result<()> {
        let path = self.session_path();
        match workout {
            Some(w) => save_atomic(&path, w),
            None => {
                if path.exists() {
                    std::fs::remove_file(&path)?;
                    tracing::debug!("Cleared session file {:?}", path);
                }
                Ok(())
            }
        }
    }

    /// The cached history, newest first
    pub fn load_history(&self) -> Result<Vec<Workout>> {
        load_or_default(&self.history_path())
    }

    pub fn save_history(&self, history: &[Workout]) -> Result<()> {
        save_atomic(&self.history_path(), history)
    }

    /// Body weight and measurement logs
    pub fn load_progress(&self) -> Result<ProgressLog> {
        load_or_default(&self.progress_path())
    }

    pub fn save_progress(&self, progress: &ProgressLog) -> Result<()> {
        save_atomic(&self.progress_path(), progress)
    }
}

/// Load JSON from a file with shared locking
///
/// Returns the default value if the file doesn't exist.
/// If the file is corrupted, logs a warning and returns the default value.
fn load_or_default<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        tracing::debug!("No state file at {:?}, using defaults", path);
        return Ok(T::default());
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open state file {:?}: {}. Using defaults.", path, e);
            return Ok(T::default());
        }
    };

    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock state file {:?}: {}. Using defaults.", path, e);
        return Ok(T::default());
    }

    let mut contents = String::new();
    let mut reader = std::io::BufReader::new(&file);
    if let Err(e) = reader.read_to_string(&mut contents) {
        let _ = file.unlock();
        tracing::warn!("Failed to read state file {:?}: {}. Using defaults.", path, e);
        return Ok(T::default());
    }

    file.unlock()?;

    match serde_json::from_str::<T>(&contents) {
        Ok(value) => {
            tracing::debug!("Loaded state from {:?}", path);
            Ok(value)
        }
        Err(e) => {
            tracing::warn!("Failed to parse state file {:?}: {}. Using defaults.", path, e);
            Ok(T::default())
        }
    }
}

/// Atomically write JSON by writing a locked temp file, syncing it and
/// renaming it over the original
fn save_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::State(format!("State path {:?} has no parent", path)))?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(value)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Saved state to {:?}", path);
    Ok(())
}
