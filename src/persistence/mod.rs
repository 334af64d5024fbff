//! Save/load of progress and best times
//!
//! Features:
//! - Key/value [`Storage`] abstraction (browser local storage, a file, memory)
//! - JSON blobs in the shape the game has always written
//! - Corrupted or missing data falls back to defaults, never an error

use std::collections::HashMap;

use crate::error::{EngineError, Result};
use crate::progression::ProgressSnapshot;
use crate::sim::GameSession;
use crate::time_attack::BestTimes;

/// Storage key for the story progress blob
pub const PROGRESS_KEY: &str = "midnight_meowathon_progress";
/// Storage key for the per-boss best times
pub const BEST_TIMES_KEY: &str = "midnight_meowathon_best_times";

/// String key/value store provided by the host
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

/// In-process storage (tests, native demo)
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

pub fn save_progress(storage: &mut dyn Storage, snapshot: &ProgressSnapshot) -> Result<()> {
    let json = serde_json::to_string(snapshot).map_err(EngineError::Snapshot)?;
    storage.set(PROGRESS_KEY, json);
    log::info!("Progress saved (stage {})", snapshot.current_stage);
    Ok(())
}

/// Load saved progress, `None` when nothing usable is stored
pub fn load_progress(storage: &dyn Storage) -> Option<ProgressSnapshot> {
    let json = storage.get(PROGRESS_KEY)?;
    match serde_json::from_str(&json) {
        Ok(snapshot) => {
            log::info!("Loaded saved progress");
            Some(snapshot)
        }
        Err(e) => {
            log::warn!("Ignoring corrupted progress save: {}", e);
            None
        }
    }
}

pub fn clear_progress(storage: &mut dyn Storage) {
    storage.remove(PROGRESS_KEY);
}

pub fn save_best_times(storage: &mut dyn Storage, times: &BestTimes) -> Result<()> {
    let json = serde_json::to_string(times).map_err(EngineError::Snapshot)?;
    storage.set(BEST_TIMES_KEY, json);
    Ok(())
}

pub fn load_best_times(storage: &dyn Storage) -> BestTimes {
    let Some(json) = storage.get(BEST_TIMES_KEY) else {
        return BestTimes::default();
    };
    serde_json::from_str(&json).unwrap_or_else(|e| {
        log::warn!("Ignoring corrupted best times: {}", e);
        BestTimes::default()
    })
}

/// Write the session's progress, power-ups and best times
pub fn save_session(storage: &mut dyn Storage, session: &GameSession) -> Result<()> {
    save_progress(storage, &session.progress_snapshot())?;
    save_best_times(storage, &session.best_times)
}

/// Restore whatever is saved into `session`; missing data leaves defaults
pub fn load_session(storage: &dyn Storage, session: &mut GameSession) {
    if let Some(snapshot) = load_progress(storage) {
        session.restore_progress(&snapshot);
    }
    session.best_times = load_best_times(storage);
}
