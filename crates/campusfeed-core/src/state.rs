use campusfeed_cache::StateCache;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Storage key for the dismissed-notification ids
pub const DISMISSED_KEY: &str = "dismissedNotifications";
/// Storage key for the read-notification ids
pub const READ_KEY: &str = "readNotifications";

/// Where the read and dismissed sets live between runs
///
/// Values are opaque strings and each `store` replaces the whole value.
pub trait StateBackend: Send {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn store(&self, key: &str, value: &str) -> Result<()>;
}

impl StateBackend for StateCache {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key)?)
    }

    fn store(&self, key: &str, value: &str) -> Result<()> {
        Ok(self.put(key, value)?)
    }
}

/// In-process backend. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current raw value under a key
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }
}

impl StateBackend for MemoryBackend {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Error::StateError("memory backend lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn store(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::StateError("memory backend lock poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Which notifications have been read or dismissed
///
/// Read is cosmetic. Dismissed keeps an id out of every feed built
/// afterwards. Both sets only grow, except that `reset_read_state` empties
/// the read set. Every change writes the full set back to the backend.
pub struct NotificationState {
    read: HashSet<String>,
    dismissed: HashSet<String>,
    backend: Box<dyn StateBackend>,
}

impl NotificationState {
    /// Load both sets, starting empty if missing or unreadable
    pub fn load(backend: Box<dyn StateBackend>) -> Self {
        let read = load_set(backend.as_ref(), READ_KEY);
        let dismissed = load_set(backend.as_ref(), DISMISSED_KEY);
        debug!(
            "Loaded notification state: {} read, {} dismissed",
            read.len(),
            dismissed.len()
        );

        Self {
            read,
            dismissed,
            backend,
        }
    }

    /// Fresh state over a throwaway in-memory backend
    pub fn in_memory() -> Self {
        Self::load(Box::new(MemoryBackend::new()))
    }

    pub fn is_read(&self, id: &str) -> bool {
        self.read.contains(id)
    }

    pub fn is_dismissed(&self, id: &str) -> bool {
        self.dismissed.contains(id)
    }

    pub fn read_ids(&self) -> &HashSet<String> {
        &self.read
    }

    pub fn dismissed_ids(&self) -> &HashSet<String> {
        &self.dismissed
    }

    /// Returns false (and writes nothing) if the id was already read
    pub fn mark_read(&mut self, id: &str) -> Result<bool> {
        if !self.read.insert(id.to_string()) {
            return Ok(false);
        }
        self.persist(READ_KEY, &self.read)?;
        Ok(true)
    }

    /// Add every given id to the read set; returns how many were new
    pub fn mark_all_read<I, S>(&mut self, ids: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.read.len();
        self.read.extend(ids.into_iter().map(Into::into));
        let added = self.read.len() - before;

        if added > 0 {
            self.persist(READ_KEY, &self.read)?;
        }
        Ok(added)
    }

    /// Returns false if the id was already dismissed
    pub fn dismiss(&mut self, id: &str) -> Result<bool> {
        if !self.dismissed.insert(id.to_string()) {
            return Ok(false);
        }
        self.persist(DISMISSED_KEY, &self.dismissed)?;
        Ok(true)
    }

    /// Forget what's been read. Dismissals stay.
    pub fn reset_read_state(&mut self) -> Result<()> {
        self.read.clear();
        self.persist(READ_KEY, &self.read)
    }

    fn persist(&self, key: &str, ids: &HashSet<String>) -> Result<()> {
        // Sorted so the stored value doesn't churn between identical sets
        let mut sorted: Vec<&String> = ids.iter().collect();
        sorted.sort();
        let value = serde_json::to_string(&sorted)?;
        self.backend.store(key, &value)
    }
}

fn load_set(backend: &dyn StateBackend, key: &str) -> HashSet<String> {
    let raw = match backend.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return HashSet::new(),
        Err(e) => {
            warn!("Could not read {}: {}. Starting empty", key, e);
            return HashSet::new();
        }
    };

    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(ids) => ids.into_iter().collect(),
        Err(e) => {
            warn!("Ignoring malformed {} ({}). Starting empty", key, e);
            HashSet::new()
        }
    }
}
