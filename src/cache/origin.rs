//! Persistent origin cache
//!
//! A key-by-URI byte-blob store with the four operations the resolution
//! pipeline needs: `match_entry`, `put`, `keys` and `delete`. Deleting a key
//! that is already gone is not an error; two resolutions may race to evict
//! the same stale entry.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Result, ViewerError};

#[async_trait::async_trait]
pub trait OriginCache: Send + Sync + Debug {
    /// Payload stored under exactly `uri`, if any
    async fn match_entry(&self, uri: &str) -> Result<Option<Vec<u8>>>;

    /// Store (or replace) the payload under `uri`
    async fn put(&self, uri: &str, payload: &[u8]) -> Result<()>;

    /// Every stored key
    async fn keys(&self) -> Result<Vec<String>>;

    /// Remove `uri`; returns whether an entry was actually removed
    async fn delete(&self, uri: &str) -> Result<bool>;

    /// Cache name (for logging)
    fn name(&self) -> &str;
}

/// In-memory origin cache
///
/// Clones share entries. Writes can be made to fail to exercise the
/// best-effort paths.
#[derive(Clone, Debug)]
pub struct MemoryOriginCache {
    name: String,
    entries: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
    fail_writes: Arc<AtomicBool>,
}

impl Default for MemoryOriginCache {
    fn default() -> Self {
        Self::new("models_cache")
    }
}

impl MemoryOriginCache {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Arc::new(RwLock::new(BTreeMap::new())),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make `put` and `delete` fail from now on
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of the stored keys
    pub fn stored_keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ViewerError::Store(format!("{} is read-only", self.name)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl OriginCache for MemoryOriginCache {
    async fn match_entry(&self, uri: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().get(uri).cloned())
    }

    async fn put(&self, uri: &str, payload: &[u8]) -> Result<()> {
        self.check_writable()?;
        self.entries
            .write()
            .insert(uri.to_string(), payload.to_vec());
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.stored_keys())
    }

    async fn delete(&self, uri: &str) -> Result<bool> {
        self.check_writable()?;
        Ok(self.entries.write().remove(uri).is_some())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(feature = "runtime-tokio")]
pub use disk::DiskOriginCache;

#[cfg(feature = "runtime-tokio")]
mod disk {
    use std::io::ErrorKind;
    use std::path::{Path, PathBuf};

    use xxhash_rust::xxh3::xxh3_64;

    use super::OriginCache;
    use crate::error::Result;

    const PAYLOAD_EXT: &str = "bin";
    const KEY_EXT: &str = "key";

    /// Origin cache persisted under a directory
    ///
    /// Each entry is a payload file plus a key file holding the original URI,
    /// both named by the xxh3 hash of the URI.
    #[derive(Clone, Debug)]
    pub struct DiskOriginCache {
        name: String,
        dir: PathBuf,
    }

    impl DiskOriginCache {
        /// Open (and create if needed) the cache directory `<root>/<name>`
        pub async fn open(root: impl AsRef<Path>, name: impl Into<String>) -> Result<Self> {
            let name = name.into();
            let dir = root.as_ref().join(&name);
            tokio::fs::create_dir_all(&dir).await?;
            Ok(Self { name, dir })
        }

        pub fn dir(&self) -> &Path {
            &self.dir
        }

        fn entry_path(&self, uri: &str, ext: &str) -> PathBuf {
            self.dir.join(format!("{:016x}.{ext}", xxh3_64(uri.as_bytes())))
        }
    }

    async fn remove_if_present(path: &Path) -> Result<bool> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    #[async_trait::async_trait]
    impl OriginCache for DiskOriginCache {
        async fn match_entry(&self, uri: &str) -> Result<Option<Vec<u8>>> {
            // The key file guards against hash collisions and half-written entries.
            match tokio::fs::read_to_string(self.entry_path(uri, KEY_EXT)).await {
                Ok(stored) if stored == uri => {}
                Ok(_) => return Ok(None),
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e.into()),
            }
            match tokio::fs::read(self.entry_path(uri, PAYLOAD_EXT)).await {
                Ok(bytes) => Ok(Some(bytes)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        }

        async fn put(&self, uri: &str, payload: &[u8]) -> Result<()> {
            tokio::fs::write(self.entry_path(uri, PAYLOAD_EXT), payload).await?;
            tokio::fs::write(self.entry_path(uri, KEY_EXT), uri.as_bytes()).await?;
            Ok(())
        }

        async fn keys(&self) -> Result<Vec<String>> {
            let mut keys = Vec::new();
            let mut entries = tokio::fs::read_dir(&self.dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some(KEY_EXT) {
                    continue;
                }
                match tokio::fs::read_to_string(&path).await {
                    Ok(key) => keys.push(key),
                    // Deleted by a concurrent eviction between listing and reading.
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
            keys.sort();
            Ok(keys)
        }

        async fn delete(&self, uri: &str) -> Result<bool> {
            let had_key = remove_if_present(&self.entry_path(uri, KEY_EXT)).await?;
            let had_payload = remove_if_present(&self.entry_path(uri, PAYLOAD_EXT)).await?;
            Ok(had_key || had_payload)
        }

        fn name(&self) -> &str {
            &self.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_memory_cache_operations() {
        let cache = MemoryOriginCache::new("models_cache");
        block_on(cache.put("m/a-1.glb.gz", &[1, 2])).unwrap();

        assert_eq!(block_on(cache.match_entry("m/a-1.glb.gz")).unwrap(), Some(vec![1, 2]));
        assert_eq!(block_on(cache.match_entry("m/a-2.glb.gz")).unwrap(), None);
        assert_eq!(block_on(cache.keys()).unwrap(), vec!["m/a-1.glb.gz".to_string()]);

        assert!(block_on(cache.delete("m/a-1.glb.gz")).unwrap());
        assert!(!block_on(cache.delete("m/a-1.glb.gz")).unwrap());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_memory_cache_write_failures() {
        let cache = MemoryOriginCache::default();
        cache.set_fail_writes(true);
        assert!(block_on(cache.put("a-1", &[1])).is_err());
        assert!(block_on(cache.delete("a-1")).is_err());
        assert!(block_on(cache.keys()).unwrap().is_empty());
    }

    #[cfg(feature = "runtime-tokio")]
    #[tokio::test]
    async fn test_disk_cache_persists_across_handles() {
        let root = tempfile::tempdir().unwrap();
        let cache = DiskOriginCache::open(root.path(), "models_cache").await.unwrap();
        cache.put("static/models/perseverance-a.glb.gz", b"payload").await.unwrap();

        let reopened = DiskOriginCache::open(root.path(), "models_cache").await.unwrap();
        assert_eq!(
            reopened.match_entry("static/models/perseverance-a.glb.gz").await.unwrap(),
            Some(b"payload".to_vec())
        );
        assert_eq!(
            reopened.keys().await.unwrap(),
            vec!["static/models/perseverance-a.glb.gz".to_string()]
        );

        assert!(reopened.delete("static/models/perseverance-a.glb.gz").await.unwrap());
        assert!(!cache.delete("static/models/perseverance-a.glb.gz").await.unwrap());
        assert!(cache.keys().await.unwrap().is_empty());
    }
}
