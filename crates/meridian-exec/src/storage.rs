//! In-memory key-value store with per-record home metadata.
//!
//! This is the storage an execution node reads during real execution and
//! the target of the bootstrap loaders. Records carry the home region
//! assigned by the metadata initializer at load time; the external
//! replication layer relies on that assignment, so it is set once and
//! only changed by an explicit re-mastering.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use meridian_common::{Key, RegionId};
use parking_lot::RwLock;

use crate::adapter::StorageAdapter;
use crate::metadata::MetadataInitializer;

/// One stored record: row bytes plus placement metadata.
#[derive(Debug, Clone)]
pub struct Record {
    /// Serialized row value.
    pub value: Bytes,
    /// Region that masters this record.
    pub home: RegionId,
}

/// Shared in-memory storage for one partition.
#[derive(Default)]
pub struct MemoryStorage {
    records: RwLock<HashMap<Key, Record>>,
}

impl MemoryStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the row bytes for `key`.
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<Bytes> {
        self.records.read().get(key).map(|r| r.value.clone())
    }

    /// Reads the full record for `key`.
    #[must_use]
    pub fn get_record(&self, key: &Key) -> Option<Record> {
        self.records.read().get(key).cloned()
    }

    /// Home region of `key`, if stored.
    #[must_use]
    pub fn home(&self, key: &Key) -> Option<RegionId> {
        self.records.read().get(key).map(|r| r.home)
    }

    /// Inserts or overwrites a record.
    pub fn put(&self, key: Key, value: Bytes, home: RegionId) {
        self.records.write().insert(key, Record { value, home });
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Snapshot of all stored keys, unordered.
    #[must_use]
    pub fn keys(&self) -> Vec<Key> {
        self.records.read().keys().cloned().collect()
    }

    /// Snapshot of all records, unordered.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(Key, Record)> {
        self.records
            .read()
            .iter()
            .map(|(k, r)| (k.clone(), r.clone()))
            .collect()
    }
}

/// Bootstrap adapter used by data loaders.
///
/// Inserts write straight to storage, assigning each record's home region
/// through the family's metadata initializer.
pub struct LoadAdapter {
    storage: Arc<MemoryStorage>,
    initializer: MetadataInitializer,
}

impl LoadAdapter {
    /// Creates a loader adapter over `storage`.
    #[must_use]
    pub fn new(storage: Arc<MemoryStorage>, initializer: MetadataInitializer) -> Self {
        Self {
            storage,
            initializer,
        }
    }
}

impl StorageAdapter for LoadAdapter {
    fn select(&self, key: &Key) -> Option<Bytes> {
        self.storage.get(key)
    }

    fn insert(&self, key: Key, value: Bytes) -> bool {
        let home = self.initializer.compute_home(&key);
        self.storage.put(key, value, home);
        true
    }

    fn update(&self, key: &Key, value: Option<Bytes>) -> bool {
        match value {
            Some(value) => {
                let Some(home) = self.storage.home(key) else {
                    return false;
                };
                self.storage.put(key.clone(), value, home);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_and_home() {
        let storage = MemoryStorage::new();
        let key = Key::from_bytes(b"k");
        storage.put(key.clone(), Bytes::from_static(b"v"), 2);
        assert_eq!(storage.get(&key).unwrap().as_ref(), b"v");
        assert_eq!(storage.home(&key), Some(2));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_load_adapter_assigns_home() {
        let storage = Arc::new(MemoryStorage::new());
        let adapter = LoadAdapter::new(
            Arc::clone(&storage),
            MetadataInitializer::Constant { home: 1 },
        );
        let key = Key::from_bytes(b"row");
        assert!(adapter.insert(key.clone(), Bytes::from_static(b"v")));
        assert_eq!(storage.home(&key), Some(1));
    }

    #[test]
    fn test_load_adapter_update_keeps_home() {
        let storage = Arc::new(MemoryStorage::new());
        let adapter = LoadAdapter::new(
            Arc::clone(&storage),
            MetadataInitializer::Constant { home: 1 },
        );
        let key = Key::from_bytes(b"row");
        adapter.insert(key.clone(), Bytes::from_static(b"v1"));
        assert!(adapter.update(&key, Some(Bytes::from_static(b"v2"))));
        assert_eq!(storage.get(&key).unwrap().as_ref(), b"v2");
        assert_eq!(storage.home(&key), Some(1));
        assert!(!adapter.update(&Key::from_bytes(b"absent"), Some(Bytes::new())));
    }
}
