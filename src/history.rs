//! Local run history: an append-only, capacity-bounded log of past
//! generations, persisted to a single JSON file.
//!
//! The store is session-local state, not a database: it is read once at
//! startup and rewritten in full after every mutation. Persistence failures
//! (missing home directory, read-only disk, quota) are swallowed with a
//! warning; the in-memory list remains authoritative for the session and
//! the user simply experiences non-persistence, never a crash. A corrupt
//! file on load is treated the same way: start empty.
//!
//! Invariants:
//! - entries are ordered newest-first; the most recent append is index 0
//! - the list never exceeds the configured capacity (default 20); overflow
//!   silently evicts the oldest entries
//! - an entry is only ever created for a *successful* completion; callers
//!   must not append failed runs

use crate::mode::Mode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};
use uuid::Uuid;

/// One persisted record of a past successful generation run.
///
/// Never mutated after creation; deleted individually or via clear-all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub mode: Mode,
    pub notes: String,
    pub output: String,
}

/// Bounded newest-first history with JSON-file persistence.
pub struct HistoryStore {
    entries: Vec<HistoryEntry>,
    path: Option<PathBuf>,
    capacity: usize,
}

impl HistoryStore {
    /// Load history from `path`, or start empty when the file is missing,
    /// unreadable, or corrupt. `path = None` disables persistence entirely.
    pub fn load(path: Option<PathBuf>, capacity: usize) -> Self {
        let mut entries: Vec<HistoryEntry> = match &path {
            Some(p) => match std::fs::read_to_string(p) {
                Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                    warn!("history file {} is corrupt, starting empty: {e}", p.display());
                    Vec::new()
                }),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
                Err(e) => {
                    warn!("could not read history {}: {e}", p.display());
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        entries.truncate(capacity);
        debug!("loaded {} history entries", entries.len());

        Self {
            entries,
            path,
            capacity,
        }
    }

    /// A store with no backing file (tests, `--no-history`).
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            path: None,
            capacity,
        }
    }

    /// Record a successful run. Prepends, evicts past capacity, persists.
    pub fn append(&mut self, mode: Mode, notes: String, output: String) -> &HistoryEntry {
        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            mode,
            notes,
            output,
        };
        self.entries.insert(0, entry);
        self.entries.truncate(self.capacity);
        self.persist();
        &self.entries[0]
    }

    /// Remove exactly one entry by id. Returns whether anything was removed;
    /// relative order of the remaining entries is unchanged.
    pub fn remove(&mut self, id: &Uuid) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| &e.id != id);
        let removed = self.entries.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    /// Entries, newest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Look up one entry by id.
    pub fn get(&self, id: &Uuid) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    /// Rewrite the backing file. All failures are swallowed: the in-memory
    /// list stays authoritative for the session.
    fn persist(&self) {
        let Some(path) = &self.path else { return };

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("could not create history dir {}: {e}", parent.display());
                return;
            }
        }

        let json = match serde_json::to_string_pretty(&self.entries) {
            Ok(j) => j,
            Err(e) => {
                warn!("could not serialise history: {e}");
                return;
            }
        };

        if let Err(e) = std::fs::write(path, json) {
            warn!("could not write history {}: {e}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(store: &mut HistoryStore, n: usize) {
        for i in 0..n {
            store.append(Mode::Explain, format!("notes {i}"), format!("out {i}"));
        }
    }

    #[test]
    fn newest_entry_is_index_zero() {
        let mut store = HistoryStore::in_memory(20);
        store.append(Mode::Quiz, "first".into(), "a".into());
        store.append(Mode::Explain, "second".into(), "b".into());
        assert_eq!(store.entries()[0].notes, "second");
        assert_eq!(store.entries()[1].notes, "first");
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut store = HistoryStore::in_memory(20);
        filled(&mut store, 35);
        assert_eq!(store.entries().len(), 20);
        // The newest 20 survive; the oldest were evicted silently.
        assert_eq!(store.entries()[0].notes, "notes 34");
        assert_eq!(store.entries()[19].notes, "notes 15");
    }

    #[test]
    fn remove_deletes_exactly_one_and_keeps_order() {
        let mut store = HistoryStore::in_memory(20);
        filled(&mut store, 5);
        let target = store.entries()[2].id;

        assert!(store.remove(&target));
        assert_eq!(store.entries().len(), 4);
        let notes: Vec<&str> = store.entries().iter().map(|e| e.notes.as_str()).collect();
        assert_eq!(notes, vec!["notes 4", "notes 3", "notes 1", "notes 0"]);

        assert!(!store.remove(&target), "second remove is a no-op");
    }

    #[test]
    fn clear_empties_the_store() {
        let mut store = HistoryStore::in_memory(20);
        filled(&mut store, 3);
        store.clear();
        assert!(store.entries().is_empty());
    }

    #[test]
    fn persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut store = HistoryStore::load(Some(path.clone()), 20);
        store.append(Mode::Practice, "ohm's law".into(), "problems…".into());
        let id = store.entries()[0].id;

        let reloaded = HistoryStore::load(Some(path), 20);
        assert_eq!(reloaded.entries().len(), 1);
        assert_eq!(reloaded.entries()[0].id, id);
        assert_eq!(reloaded.entries()[0].mode, Mode::Practice);
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = HistoryStore::load(Some(path), 20);
        assert!(store.entries().is_empty());
    }

    #[test]
    fn unwritable_path_does_not_crash() {
        // Parent that cannot be created on any sane system.
        let path = PathBuf::from("/proc/nonexistent/history.json");
        let mut store = HistoryStore::load(Some(path), 20);
        store.append(Mode::Quiz, "n".into(), "o".into());
        assert_eq!(store.entries().len(), 1);
    }

    #[test]
    fn load_truncates_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut store = HistoryStore::load(Some(path.clone()), 30);
        filled(&mut store, 30);

        let reloaded = HistoryStore::load(Some(path), 20);
        assert_eq!(reloaded.entries().len(), 20);
    }
}
