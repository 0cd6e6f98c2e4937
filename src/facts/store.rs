//! Local fact-sheet snapshots
//!
//! A synchronous string-keyed store holds one reserved key whose value is a
//! JSON object mapping logical model names to their last fetched fact sheet.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::FactSheet;
use crate::error::{Result, ViewerError};

/// String-keyed persistent store
pub trait KeyValueStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store; clones share contents
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: Arc<RwLock<HashMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `set` and `remove` fail from now on
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ViewerError::Store("quota exceeded".to_string()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_writable()?;
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.check_writable()?;
        self.values.write().remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key under a directory
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(ViewerError::Store(format!("invalid store key {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        std::fs::write(self.path(key)?, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path(key)?) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Fact-sheet snapshots under one reserved key of a [`KeyValueStore`]
#[derive(Clone, Debug)]
pub struct FactStore {
    backend: Arc<dyn KeyValueStore>,
    key: String,
}

impl FactStore {
    pub fn new(backend: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Snapshot stored for `logical_name`, if any
    pub fn load(&self, logical_name: &str) -> Result<Option<FactSheet>> {
        let mut snapshots = self.read_all()?;
        Ok(snapshots.remove(logical_name))
    }

    /// Store `sheet` under `logical_name`, replacing any earlier snapshot
    pub fn save(&self, logical_name: &str, sheet: &FactSheet) -> Result<()> {
        // An unreadable map is replaced rather than blocking the write.
        let mut snapshots = self.read_all().unwrap_or_else(|e| {
            log::warn!("Discarding unreadable fact snapshots under {:?}: {e}", self.key);
            BTreeMap::new()
        });
        snapshots.insert(logical_name.to_string(), sheet.clone());
        self.backend
            .set(&self.key, &serde_json::to_string(&snapshots)?)
    }

    fn read_all(&self) -> Result<BTreeMap<String, FactSheet>> {
        match self.backend.get(&self.key)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(BTreeMap::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(title: &str) -> FactSheet {
        FactSheet {
            topic: "Perseverance_(rover)".into(),
            title: title.into(),
            extract: "A rover.".into(),
            infobox: vec![("Dry mass".into(), "1,025 kg".into())],
        }
    }

    #[test]
    fn test_save_and_load() {
        let store = FactStore::new(Arc::new(MemoryStore::new()), "wikis");
        assert_eq!(store.load("perseverance").unwrap(), None);

        store.save("perseverance", &sheet("Perseverance")).unwrap();
        store.save("ingenuity", &sheet("Ingenuity")).unwrap();
        store.save("perseverance", &sheet("Perseverance (rover)")).unwrap();

        assert_eq!(
            store.load("perseverance").unwrap(),
            Some(sheet("Perseverance (rover)"))
        );
        assert_eq!(store.load("ingenuity").unwrap(), Some(sheet("Ingenuity")));
    }

    #[test]
    fn test_corrupt_snapshot_map() {
        let backend = MemoryStore::new();
        backend.set("wikis", "{not json").unwrap();
        let store = FactStore::new(Arc::new(backend), "wikis");

        assert!(matches!(store.load("perseverance"), Err(ViewerError::Json(_))));
        store.save("perseverance", &sheet("Perseverance")).unwrap();
        assert!(store.load("perseverance").unwrap().is_some());
    }

    #[test]
    fn test_failed_write_surfaces_error() {
        let backend = MemoryStore::new();
        backend.set_fail_writes(true);
        let store = FactStore::new(Arc::new(backend), "wikis");
        assert!(matches!(
            store.save("perseverance", &sheet("Perseverance")),
            Err(ViewerError::Store(_))
        ));
    }

    #[test]
    fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        assert_eq!(store.get("wikis").unwrap(), None);
        store.set("wikis", "{}").unwrap();
        assert_eq!(FileStore::open(dir.path()).unwrap().get("wikis").unwrap().as_deref(), Some("{}"));

        store.remove("wikis").unwrap();
        store.remove("wikis").unwrap();
        assert_eq!(store.get("wikis").unwrap(), None);
        assert!(store.set("../escape", "{}").is_err());
    }
}
