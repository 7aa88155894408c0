//! Append-only JSONL repositories with a bounded in-memory index.
//!
//! One log file per record kind (`conversations.jsonl`, `tasks.jsonl`,
//! `messages.jsonl`); a `VecDeque` + `HashMap<id, seq>` ring keeps the most
//! recent `MAX_RECORDS_IN_MEMORY` records queryable in O(1) without
//! re-reading the log on every request.

use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

const MAX_RECORDS_IN_MEMORY: usize = 2_000;

/// Anything a [`JsonlRepository`] can store: addressable by a stable `Uuid`.
pub trait Record: Clone + Serialize + DeserializeOwned {
    fn id(&self) -> Uuid;
}

struct RepositoryInner<T> {
    records: VecDeque<T>,
    index: HashMap<Uuid, usize>,
    base_seq: usize,
}

impl<T: Record> RepositoryInner<T> {
    fn new(records: VecDeque<T>) -> Self {
        let mut index = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            index.insert(record.id(), i);
        }
        Self {
            records,
            index,
            base_seq: 0,
        }
    }

    fn deque_idx(&self, seq: usize) -> usize {
        seq - self.base_seq
    }

    fn get(&self, id: &Uuid) -> Option<&T> {
        let seq = *self.index.get(id)?;
        self.records.get(self.deque_idx(seq))
    }

    fn get_mut(&mut self, id: &Uuid) -> Option<&mut T> {
        let seq = *self.index.get(id)?;
        self.records.get_mut(self.deque_idx(seq))
    }

    fn push_back(&mut self, record: T) {
        let seq = self.base_seq + self.records.len();
        self.index.insert(record.id(), seq);
        self.records.push_back(record);
    }

    fn pop_front(&mut self) -> Option<T> {
        let record = self.records.pop_front()?;
        let popped_seq = self.base_seq;
        self.base_seq += 1;
        // The same id can occupy multiple slots (each `update()` call appends
        // a new version line, and all versions still resident get loaded back
        // in on restart). Only drop the index entry if it still points at the
        // slot we just evicted — otherwise a newer version of this id is
        // still in the deque and the index must keep pointing at it.
        if self.index.get(&record.id()) == Some(&popped_seq) {
            self.index.remove(&record.id());
        }
        Some(record)
    }
}

/// One append-only JSONL log plus its in-memory ring.
pub struct JsonlRepository<T> {
    inner: RwLock<RepositoryInner<T>>,
    log_path: PathBuf,
}

impl<T: Record> JsonlRepository<T> {
    /// Opens (creating if absent) `{state_path}/{file_name}`, loading the
    /// most recent records into memory and pruning the file on disk if it
    /// held more than `MAX_RECORDS_IN_MEMORY`.
    pub fn new(state_path: &Path, file_name: &str) -> Self {
        std::fs::create_dir_all(state_path).ok();
        let log_path = state_path.join(file_name);
        let (records, total_on_disk) = Self::load_recent(&log_path);

        if total_on_disk > records.len() {
            tracing::info!(
                file = file_name,
                kept = records.len(),
                pruned = total_on_disk - records.len(),
                "pruning repository log on disk"
            );
            Self::rewrite_jsonl(&log_path, &records);
        }

        Self {
            inner: RwLock::new(RepositoryInner::new(records)),
            log_path,
        }
    }

    fn load_recent(path: &Path) -> (VecDeque<T>, usize) {
        let mut records = VecDeque::new();
        let mut total = 0;
        if let Ok(content) = std::fs::read_to_string(path) {
            let lines: Vec<&str> = content.lines().collect();
            total = lines.len();
            for line in lines.iter().rev().take(MAX_RECORDS_IN_MEMORY) {
                if let Ok(record) = serde_json::from_str::<T>(line) {
                    records.push_front(record);
                }
            }
        }
        (records, total)
    }

    fn rewrite_jsonl(path: &Path, records: &VecDeque<T>) {
        let tmp = path.with_extension("jsonl.tmp");
        let mut ok = false;
        if let Ok(mut file) = std::fs::File::create(&tmp) {
            ok = true;
            for record in records {
                match serde_json::to_string(record) {
                    Ok(json) if writeln!(file, "{json}").is_ok() => {}
                    _ => {
                        ok = false;
                        break;
                    }
                }
            }
        }
        if ok {
            let _ = std::fs::rename(&tmp, path);
        } else {
            let _ = std::fs::remove_file(&tmp);
        }
    }

    /// Inserts and appends to the log. Evicts the oldest in-memory record
    /// (never the on-disk copy) once the ring exceeds its bound.
    pub fn insert(&self, record: T) -> Uuid {
        let id = record.id();
        self.append_line(&record);
        let mut inner = self.inner.write();
        inner.push_back(record);
        if inner.records.len() > MAX_RECORDS_IN_MEMORY {
            inner.pop_front();
        }
        id
    }

    /// Mutates an in-memory record in place and appends the new value to the
    /// log (the log is a history of versions, not a single current value).
    pub fn update<F>(&self, id: &Uuid, f: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        let mut inner = self.inner.write();
        let Some(record) = inner.get_mut(id) else {
            return false;
        };
        f(record);
        let snapshot = record.clone();
        drop(inner);
        self.append_line(&snapshot);
        true
    }

    fn append_line(&self, record: &T) {
        if let Ok(json) = serde_json::to_string(record) {
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log_path)
            {
                let _ = writeln!(file, "{json}");
            }
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.inner.read().get(id).cloned()
    }

    pub fn list_recent(&self, limit: usize) -> Vec<T> {
        let inner = self.inner.read();
        inner
            .records
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }
}
