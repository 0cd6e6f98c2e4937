//! Integration tests for fact resolution and the local snapshot store

mod common;

use std::sync::Arc;

use common::{encyclopedia, ROVER_ID};
use futures::executor::block_on;
use mission_viewer::{
    FactProvider, FactStore, FileStore, KeyValueStore, MemoryStore, ModelId, ViewerError,
};

fn provider(backend: Arc<dyn KeyValueStore>, offline: bool) -> FactProvider {
    let source = encyclopedia();
    source.set_offline(offline);
    FactProvider::new(Arc::new(source), FactStore::new(backend, "wikis")).unwrap()
}

#[test]
fn test_offline_session_reads_stored_snapshot() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let id = ModelId::new(ROVER_ID).unwrap();

    let online = block_on(provider(backend.clone(), false).resolve(&id, "perseverance")).unwrap();
    let offline = block_on(provider(backend, true).resolve(&id, "perseverance")).unwrap();

    assert_eq!(*offline, *online);
}

#[test]
fn test_stored_attributes_are_clean() {
    let backend = MemoryStore::new();
    let id = ModelId::new(ROVER_ID).unwrap();
    block_on(provider(Arc::new(backend.clone()), false).resolve(&id, "perseverance")).unwrap();

    let raw = backend.get("wikis").unwrap().unwrap();
    assert!(raw.contains("\"perseverance\""));
    assert!(!raw.contains("<sup"));
    assert!(!raw.contains("&nbsp;"));
    assert!(raw.contains("18 February 2021, 20:55UTC"));
}

#[test]
fn test_offline_without_snapshot_fails() {
    let id = ModelId::new(ROVER_ID).unwrap();
    let result = block_on(provider(Arc::new(MemoryStore::new()), true).resolve(&id, "perseverance"));
    assert!(matches!(result, Err(ViewerError::FactUnavailable(_))));
}

#[test]
fn test_file_store_snapshot_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let id = ModelId::new(ROVER_ID).unwrap();

    let first = FileStore::open(dir.path()).unwrap();
    let fetched = block_on(provider(Arc::new(first), false).resolve(&id, "perseverance")).unwrap();

    let second = FileStore::open(dir.path()).unwrap();
    let restored = block_on(provider(Arc::new(second), true).resolve(&id, "perseverance")).unwrap();

    assert_eq!(*restored, *fetched);
    assert_eq!(restored.attribute("Operator"), Some("NASA"));
}
