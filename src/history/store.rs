use super::storage::BlobStorage;
use crate::session::types::HistoryEntry;
use crate::{InnerVoiceError, Result};
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

/// Most entries kept; older ones are evicted
pub const HISTORY_CAPACITY: usize = 20;

/// Logical key the blob is stored under
pub const DEFAULT_HISTORY_KEY: &str = "history";

/// Bounded, persisted list of past exchanges, most recent first
#[derive(Clone)]
pub struct HistoryStore {
    entries: Arc<RwLock<VecDeque<HistoryEntry>>>,
    storage: Arc<dyn BlobStorage>,
    key: String,
}

impl HistoryStore {
    /// Empty store; nothing is read from storage
    pub fn new(storage: Arc<dyn BlobStorage>, key: impl Into<String>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(HISTORY_CAPACITY + 1))),
            storage,
            key: key.into(),
        }
    }

    /// Store rehydrated from whatever is persisted under `key`
    pub fn open(storage: Arc<dyn BlobStorage>, key: impl Into<String>) -> Self {
        let store = Self::new(storage, key);
        store.load();
        store
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Insert at the front, evict the oldest past capacity, persist.
    ///
    /// The in-memory list keeps the entry even if persisting fails.
    pub fn append(&self, entry: HistoryEntry) -> Result<()> {
        let mut entries = self.entries.write();
        entries.push_front(entry);
        while entries.len() > HISTORY_CAPACITY {
            if let Some(evicted) = entries.pop_back() {
                debug!("Evicting history entry from {}", evicted.timestamp);
            }
        }
        let snapshot: Vec<HistoryEntry> = entries.iter().cloned().collect();
        self.persist(&snapshot)
    }

    /// All entries, most recent first
    pub fn all(&self) -> Vec<HistoryEntry> {
        self.entries.read().iter().cloned().collect()
    }

    /// Entry at `index` (0 = most recent)
    pub fn select(&self, index: usize) -> Option<HistoryEntry> {
        self.entries.read().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every entry, in memory and in storage
    pub fn clear(&self) -> Result<()> {
        let mut entries = self.entries.write();
        entries.clear();
        self.storage.remove(&self.key)
    }

    /// Rehydrate from storage.
    ///
    /// Unreadable or malformed data yields an empty history instead of an
    /// error.
    pub fn load(&self) -> Vec<HistoryEntry> {
        let loaded = match self.storage.read(&self.key) {
            Ok(Some(blob)) => match decode_entries(&blob) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("{}; starting with empty history", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read history '{}': {}", self.key, e);
                Vec::new()
            }
        };

        debug!("Loaded {} history entries", loaded.len());
        *self.entries.write() = loaded.iter().cloned().collect();
        loaded
    }

    /// Serialize `entries` as one blob under the store's key
    pub fn persist(&self, entries: &[HistoryEntry]) -> Result<()> {
        let blob = serde_json::to_string(entries)
            .map_err(|e| InnerVoiceError::Storage(format!("Failed to encode history: {}", e)))?;
        self.storage.write(&self.key, &blob)
    }
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("key", &self.key)
            .field("len", &self.len())
            .finish()
    }
}

fn decode_entries(blob: &str) -> Result<Vec<HistoryEntry>> {
    if blob.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut entries: Vec<HistoryEntry> = serde_json::from_str(blob)
        .map_err(|e| InnerVoiceError::PersistenceCorruption(e.to_string()))?;
    entries.truncate(HISTORY_CAPACITY);
    Ok(entries)
}
