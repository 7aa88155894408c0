//! The State Store: one JSON file per thread, atomic write, read-through
//! memory cache.
//!
//! Mirrors the checkpoint discipline threaded through the Workflow Engine
//! loop — every node transition calls [`CheckpointStore::save`] before the
//! Supervisor routes to the next node, so a crash between transitions never
//! loses more than the in-flight node's work.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use pax_domain::state::AgentState;
use pax_domain::{Error, Result};

const TASK_STATE_TTL: Duration = Duration::from_secs(3600);

struct CachedTaskState {
    state: AgentState,
    cached_at: Instant,
}

pub struct CheckpointStore {
    threads_dir: PathBuf,
    cache: RwLock<HashMap<String, AgentState>>,
    task_state_cache: RwLock<HashMap<String, CachedTaskState>>,
}

impl CheckpointStore {
    pub fn new(state_path: &Path) -> Result<Self> {
        let threads_dir = state_path.join("threads");
        std::fs::create_dir_all(&threads_dir)?;
        Ok(Self {
            threads_dir,
            cache: RwLock::new(HashMap::new()),
            task_state_cache: RwLock::new(HashMap::new()),
        })
    }

    fn thread_path(&self, thread_id: &str) -> PathBuf {
        self.threads_dir.join(format!("{thread_id}.json"))
    }

    /// Writes the state to disk via write-to-temp-then-rename, then refreshes
    /// the in-memory read cache. The rename is the only step that can be
    /// observed half-done, and POSIX rename within one filesystem is atomic.
    pub fn save(&self, state: &AgentState) -> Result<()> {
        let thread_id = state.thread_id().to_string();
        let path = self.thread_path(&thread_id);
        let tmp = path.with_extension("json.tmp");

        let json = serde_json::to_vec_pretty(state)?;
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, &path)?;

        tracing::debug!(thread_id = %thread_id, "checkpoint written");
        self.cache.write().insert(thread_id, state.clone());
        Ok(())
    }

    /// Reads from the in-memory cache if present, else loads from disk and
    /// populates the cache.
    pub fn load(&self, thread_id: &str) -> Result<Option<AgentState>> {
        if let Some(state) = self.cache.read().get(thread_id) {
            return Ok(Some(state.clone()));
        }

        let path = self.thread_path(thread_id);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)?;
        let state: AgentState = serde_json::from_str(&raw)?;
        self.cache.write().insert(thread_id.to_string(), state.clone());
        Ok(Some(state))
    }

    /// Same as [`Self::load`], but returns `ThreadNotFound` instead of `None`
    /// — used by `resume`, where a missing thread is an error, not a fresh
    /// start.
    pub fn load_required(&self, thread_id: &str) -> Result<AgentState> {
        self.load(thread_id)?
            .ok_or_else(|| Error::ThreadNotFound(thread_id.to_string()))
    }

    /// Caches the most recent state for a task under a soft TTL, for
    /// `GET /tasks/{id}` to avoid a disk round-trip.
    pub fn cache_task_state(&self, task_id: &str, state: AgentState) {
        self.task_state_cache.write().insert(
            task_id.to_string(),
            CachedTaskState {
                state,
                cached_at: Instant::now(),
            },
        );
    }

    pub fn get_task_state(&self, task_id: &str) -> Option<AgentState> {
        let cache = self.task_state_cache.read();
        let entry = cache.get(task_id)?;
        if entry.cached_at.elapsed() > TASK_STATE_TTL {
            return None;
        }
        Some(entry.state.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AgentState {
        AgentState::new("hello", "conv-1", "user-1")
    }

    #[test]
    fn save_then_load_round_trips_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path()).unwrap();
        store.save(&state()).unwrap();
        let loaded = store.load("conv-1").unwrap().expect("state present");
        assert_eq!(loaded.conversation_id, "conv-1");
    }

    #[test]
    fn load_after_cold_start_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = CheckpointStore::new(dir.path()).unwrap();
            store.save(&state()).unwrap();
        }
        let reopened = CheckpointStore::new(dir.path()).unwrap();
        let loaded = reopened.load("conv-1").unwrap().expect("state present");
        assert_eq!(loaded.conversation_id, "conv-1");
    }

    #[test]
    fn load_missing_thread_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path()).unwrap();
        assert!(store.load("nonexistent").unwrap().is_none());
    }

    #[test]
    fn load_required_missing_thread_is_thread_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path()).unwrap();
        let err = store.load_required("nonexistent").unwrap_err();
        assert!(matches!(err, Error::ThreadNotFound(id) if id == "nonexistent"));
    }

    #[test]
    fn task_state_cache_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path()).unwrap();
        store.cache_task_state("task-1", state());
        assert!(store.get_task_state("task-1").is_some());
        assert!(store.get_task_state("nonexistent").is_none());
    }
}
