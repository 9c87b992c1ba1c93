//! Bounded, append-only log of scan runs.
//!
//! The store owns the eviction rule (keep the newest `max_entries`, drop the
//! oldest first). Where the list lives is up to a [`HistoryBackend`]: a JSON
//! file for the CLI, memory for tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use screener_core::error::HistoryError;
use screener_core::types::HistoryEntry;

/// Entries retained when no limit is configured.
pub const DEFAULT_MAX_HISTORY: usize = 200;

/// Whole-list persistence for history entries.
#[async_trait]
pub trait HistoryBackend: Send + Sync {
    /// Load the full list, oldest first. A missing store is an empty list.
    async fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError>;

    /// Replace the full list.
    async fn save(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError>;
}

/// History kept in a single pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file written first and then renamed over the target.
    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl HistoryBackend for JsonFileBackend {
    async fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No history file yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if json.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str(&json) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unreadable history file, starting empty");
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), entries = entries.len(), "History saved");
        Ok(())
    }
}

/// History kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: std::sync::Mutex<Vec<HistoryEntry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryBackend for MemoryBackend {
    async fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone())
    }

    async fn save(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        *guard = entries.to_vec();
        Ok(())
    }
}

/// Size-bounded history of scan runs.
///
/// `append` is the only mutator. Each append is a read-modify-write of the
/// whole list and runs under a process-wide lock, so concurrent appends
/// never lose an update.
pub struct HistoryStore {
    backend: Box<dyn HistoryBackend>,
    max_entries: usize,
    write_lock: Mutex<()>,
}

impl HistoryStore {
    /// Create a store over `backend`, keeping at most `max_entries` runs.
    pub fn new(backend: impl HistoryBackend + 'static, max_entries: usize) -> Self {
        Self {
            backend: Box::new(backend),
            max_entries: max_entries.max(1),
            write_lock: Mutex::new(()),
        }
    }

    /// JSON file store with the default limit.
    pub fn json_file(path: impl Into<PathBuf>) -> Self {
        Self::new(JsonFileBackend::new(path), DEFAULT_MAX_HISTORY)
    }

    /// In-memory store with the default limit.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new(), DEFAULT_MAX_HISTORY)
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Append an entry, evicting the oldest beyond the limit.
    ///
    /// If the id collides with the newest stored entry it is bumped past it
    /// so ids stay unique and increasing. Returns the stored list.
    pub async fn append(&self, mut entry: HistoryEntry) -> Result<Vec<HistoryEntry>, HistoryError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.backend.load().await?;

        if let (Some(last), Some(seq)) = (entries.last().and_then(|e| e.sequence()), entry.sequence()) {
            if seq <= last {
                entry.id = (last + 1).to_string();
            }
        }

        let id = entry.id.clone();
        let matched = entry.results.len();
        entries.push(entry);

        if entries.len() > self.max_entries {
            let excess = entries.len() - self.max_entries;
            entries.drain(..excess);
        }

        self.backend.save(&entries).await?;
        info!(id = %id, matched, stored = entries.len(), "History entry appended");
        Ok(entries)
    }

    /// All stored entries, oldest first.
    pub async fn list(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        self.backend.load().await
    }

    /// Look up one entry by id.
    pub async fn get(&self, id: &str) -> Result<HistoryEntry, HistoryError> {
        self.backend
            .load()
            .await?
            .into_iter()
            .find(|e| e.id == id)
            .ok_or_else(|| HistoryError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use screener_core::types::ScanParams;
    use std::sync::Arc;

    fn entry(seq: i64) -> HistoryEntry {
        HistoryEntry {
            id: seq.to_string(),
            timestamp: Utc.timestamp_millis_opt(seq).unwrap(),
            params: ScanParams::default(),
            results: vec![],
        }
    }

    fn temp_path() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("screener_test_history_{}.json", uuid::Uuid::new_v4()));
        p
    }

    #[tokio::test]
    async fn test_append_evicts_oldest() {
        let store = HistoryStore::in_memory();

        for i in 0..201 {
            store.append(entry(1_000 + i)).await.unwrap();
        }

        let entries = store.list().await.unwrap();
        assert_eq!(entries.len(), 200);
        assert_eq!(entries[0].id, "1001");
        assert_eq!(entries[199].id, "1200");
        assert!(matches!(store.get("1000").await, Err(HistoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_append_returns_stored_list() {
        let store = HistoryStore::new(MemoryBackend::new(), 2);

        let stored = store.append(entry(1)).await.unwrap();
        assert_eq!(stored.len(), 1);
        store.append(entry(2)).await.unwrap();
        let stored = store.append(entry(3)).await.unwrap();

        let ids: Vec<_> = stored.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[tokio::test]
    async fn test_colliding_id_is_bumped() {
        let store = HistoryStore::in_memory();
        store.append(entry(500)).await.unwrap();
        let stored = store.append(entry(500)).await.unwrap();

        assert_eq!(stored[1].id, "501");
        assert_eq!(store.get("501").await.unwrap().timestamp, entry(500).timestamp);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let store = HistoryStore::in_memory();
        store.append(entry(7)).await.unwrap();

        assert_eq!(store.get("7").await.unwrap().id, "7");
        let err = store.get("8").await.unwrap_err();
        assert!(matches!(err, HistoryError::NotFound(id) if id == "8"));
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let store = Arc::new(HistoryStore::in_memory());

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.append(entry(10_000 + i)).await })
            })
            .collect();
        for h in handles {
            h.await.unwrap().unwrap();
        }

        assert_eq!(store.list().await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_json_file_round_trip() {
        let path = temp_path();
        let store = HistoryStore::json_file(&path);

        assert!(store.list().await.unwrap().is_empty());
        store.append(entry(42)).await.unwrap();

        let reopened = HistoryStore::json_file(&path);
        let entries = reopened.list().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0], entry(42));

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_json_file_save_replaces_whole_file() {
        let path = temp_path();
        let backend = JsonFileBackend::new(&path);

        backend.save(&[entry(1), entry(2), entry(3)]).await.unwrap();
        backend.save(&[entry(4)]).await.unwrap();

        assert_eq!(backend.load().await.unwrap(), vec![entry(4)]);
        assert!(!backend.tmp_path().exists());
        assert_eq!(backend.tmp_path().parent(), path.parent());

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_as_empty() {
        let path = temp_path();
        tokio::fs::write(&path, "{not json").await.unwrap();

        let store = HistoryStore::json_file(&path);
        assert!(store.list().await.unwrap().is_empty());

        store.append(entry(1)).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 1);

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
