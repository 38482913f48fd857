use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

/// Persisted key for the demo override flag ("true" means active).
pub const DEMO_ACTIVE_KEY: &str = "demoMode";
/// Persisted key for the impersonated role keyword.
pub const DEMO_ROLE_KEY: &str = "demoRole";

/// A storage read or write failed. Reported to the caller, never fatal:
/// the in-memory half of the session state is still applied and the drift
/// across a reload is accepted.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("session store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("session store encoding: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("session store unavailable")]
    Unavailable,
}

/// Durable key/value storage for the demo flags. Pure storage, no policy:
/// `SessionContext` is the only writer. Injected so tests can substitute the
/// in-memory fake.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn clear(&self, keys: &[&str]) -> Result<(), PersistenceError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// File-backed store: one JSON document under the data root, rewritten
/// atomically (temp file + rename) on every mutation. Survives restarts, so
/// demo mode entered in one process instance is visible to the next.
pub struct FileSessionStore {
    path: PathBuf,
    cache: parking_lot::RwLock<StoreDocument>,
}

impl FileSessionStore {
    /// Load the document at `<dir>/session.json`, or start empty when the
    /// file is missing or unreadable. Unreadable is tolerated: stale or
    /// corrupt storage must never prevent startup.
    pub fn load_or_default(dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join("session.json");
        let doc = std::fs::read(&path)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<StoreDocument>(&bytes).ok())
            .unwrap_or_default();
        Self { path, cache: parking_lot::RwLock::new(doc) }
    }

    fn flush(&self, doc: &StoreDocument) -> Result<(), PersistenceError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let bytes = serde_json::to_vec_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(tmp, &self.path)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.cache.read().entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut doc = self.cache.write();
        doc.entries.insert(key.to_string(), value.to_string());
        self.flush(&doc)
    }

    fn clear(&self, keys: &[&str]) -> Result<(), PersistenceError> {
        let mut doc = self.cache.write();
        for k in keys {
            doc.entries.remove(*k);
        }
        self.flush(&doc)
    }
}

/// In-memory store for tests and persistence-free runs. `fail_writes` turns
/// every mutation into an error so callers' best-effort handling can be
/// exercised; reads keep working against whatever was stored before.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: parking_lot::RwLock<BTreeMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Direct insert bypassing the failure switch, for seeding test fixtures.
    pub fn seed(&self, key: &str, value: &str) {
        self.entries.write().insert(key.to_string(), value.to_string());
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable);
        }
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, keys: &[&str]) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable);
        }
        let mut map = self.entries.write();
        for k in keys {
            map.remove(*k);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_roundtrip_across_reload() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let store = FileSessionStore::load_or_default(tmp.path());
            store.set(DEMO_ACTIVE_KEY, "true").unwrap();
            store.set(DEMO_ROLE_KEY, "parent").unwrap();
        }
        // Fresh instance over the same directory sees the persisted values.
        let store = FileSessionStore::load_or_default(tmp.path());
        assert_eq!(store.get(DEMO_ACTIVE_KEY).unwrap().as_deref(), Some("true"));
        assert_eq!(store.get(DEMO_ROLE_KEY).unwrap().as_deref(), Some("parent"));

        store.clear(&[DEMO_ACTIVE_KEY, DEMO_ROLE_KEY]).unwrap();
        let store = FileSessionStore::load_or_default(tmp.path());
        assert_eq!(store.get(DEMO_ACTIVE_KEY).unwrap(), None);
        assert_eq!(store.get(DEMO_ROLE_KEY).unwrap(), None);
    }

    #[test]
    fn corrupt_document_starts_empty() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("session.json"), b"not json at all").unwrap();
        let store = FileSessionStore::load_or_default(tmp.path());
        assert_eq!(store.get(DEMO_ACTIVE_KEY).unwrap(), None);
    }

    #[test]
    fn memory_store_failure_switch() {
        let store = MemorySessionStore::new();
        store.set(DEMO_ACTIVE_KEY, "true").unwrap();
        store.set_fail_writes(true);
        assert!(store.set(DEMO_ROLE_KEY, "admin").is_err());
        assert!(store.clear(&[DEMO_ACTIVE_KEY]).is_err());
        // Reads still serve the last successful state.
        assert_eq!(store.get(DEMO_ACTIVE_KEY).unwrap().as_deref(), Some("true"));
    }
}
