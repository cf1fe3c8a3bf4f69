//! The two storage-adapter modes of the two-pass execution model.
//!
//! [`KeyGenAdapter`] backs the first pass: accesses touch no storage, they
//! only record the ordered read/write key set onto the wire transaction.
//! [`TxnStorageAdapter`] backs the second pass on an execution node: reads
//! serve current storage values (stamping them into the transaction's
//! value cells so results reach the client), writes stage new bytes that
//! [`apply_writes`] later installs for locally-owned rows.
//!
//! The correctness contract between the two: for the same inputs, the key
//! set recorded by the first pass is a superset of the keys the second
//! pass touches. The scheduler acquires locks from the recorded set, so a
//! body that violates this starves its own execution.

use std::collections::HashMap;

use bytes::Bytes;
use meridian_common::Key;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::warn;

use crate::metadata::MetadataInitializer;
use crate::sharder::Sharder;
use crate::storage::MemoryStorage;
use meridian_proto::{KeyType, Transaction, ValueEntry};

/// Storage capability set a transaction body is parameterized over.
pub trait StorageAdapter: Send + Sync {
    /// Reads the row bytes for `key`; `None` when missing (always `None`
    /// in key-generation mode, where the read is only recorded).
    fn select(&self, key: &Key) -> Option<Bytes>;

    /// Inserts (or overwrites) the row bytes for `key`.
    fn insert(&self, key: Key, value: Bytes) -> bool;

    /// Stages an updated row. `None` means the caller could not produce
    /// the new bytes because the current row was unreadable; execution
    /// mode fails such updates, key-generation mode still records the
    /// write intent.
    fn update(&self, key: &Key, value: Option<Bytes>) -> bool;
}

/// Ordered read/write key set collected during key generation.
#[derive(Default)]
struct KeySet {
    /// First-touch order; the recorded type is upgraded in place.
    entries: Vec<(Key, KeyType)>,
    index: HashMap<Key, usize>,
}

impl KeySet {
    fn record(&mut self, key: &Key, key_type: KeyType) {
        match self.index.get(key) {
            Some(&i) => {
                // Reads never downgrade a recorded write.
                if key_type == KeyType::Write {
                    self.entries[i].1 = KeyType::Write;
                }
            }
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key.clone(), key_type));
            }
        }
    }
}

/// Adapter for the key-generation pass.
///
/// Accesses return placeholders; the collected set is stamped onto a
/// transaction by [`KeyGenAdapter::finalize`], which also assigns the
/// home-region hint of every key through the metadata initializer.
#[derive(Default)]
pub struct KeyGenAdapter {
    keys: Mutex<KeySet>,
}

impl KeyGenAdapter {
    /// Creates an empty key-generation adapter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps the collected key set onto `txn` with home hints.
    pub fn finalize(&self, txn: &mut Transaction, initializer: &MetadataInitializer) {
        let keys = self.keys.lock();
        for (key, key_type) in &keys.entries {
            txn.push_key(
                key.clone().into_bytes(),
                *key_type,
                initializer.compute_home(key),
            );
        }
    }

    /// Number of keys recorded so far.
    #[must_use]
    pub fn num_keys(&self) -> usize {
        self.keys.lock().entries.len()
    }
}

impl StorageAdapter for KeyGenAdapter {
    fn select(&self, key: &Key) -> Option<Bytes> {
        self.keys.lock().record(key, KeyType::Read);
        None
    }

    fn insert(&self, key: Key, _value: Bytes) -> bool {
        self.keys.lock().record(&key, KeyType::Write);
        true
    }

    fn update(&self, key: &Key, _value: Option<Bytes>) -> bool {
        self.keys.lock().record(key, KeyType::Write);
        true
    }
}

/// Adapter for real execution on a node.
///
/// Owns the dispatched transaction for the duration of the run; call
/// [`TxnStorageAdapter::finish`] to move it back out once the body has
/// completed.
pub struct TxnStorageAdapter {
    storage: Arc<MemoryStorage>,
    txn: Mutex<Transaction>,
    index: HashMap<Bytes, usize>,
}

impl TxnStorageAdapter {
    /// Wraps a dispatched transaction and the node's storage.
    #[must_use]
    pub fn new(txn: Transaction, storage: Arc<MemoryStorage>) -> Self {
        let index = txn
            .keys
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.key.clone(), i))
            .collect();
        Self {
            storage,
            txn: Mutex::new(txn),
            index,
        }
    }

    /// Moves the (possibly value-stamped) transaction back out.
    pub fn finish(&self, out: &mut Transaction) {
        std::mem::swap(out, &mut *self.txn.lock());
    }

    fn entry_index(&self, key: &Key, want_write: bool) -> Option<usize> {
        let i = *self.index.get(key.as_bytes())?;
        if want_write {
            let txn = self.txn.lock();
            if txn.keys[i].key_type() != KeyType::Write {
                warn!(?key, "write to a key recorded as read-only");
                return None;
            }
        }
        Some(i)
    }

    fn stage(&self, key: &Key, value: Bytes) -> bool {
        match self.entry_index(key, true) {
            Some(i) => {
                self.txn.lock().keys[i].value_entry = Some(ValueEntry { value });
                true
            }
            None => false,
        }
    }
}

impl StorageAdapter for TxnStorageAdapter {
    fn select(&self, key: &Key) -> Option<Bytes> {
        // A key outside the declared set was not locked by the scheduler;
        // treat it as missing rather than racing other transactions.
        let i = self.entry_index(key, false)?;
        // Reads observe this transaction's own staged writes first.
        {
            let txn = self.txn.lock();
            let entry = &txn.keys[i];
            if entry.key_type() == KeyType::Write && !entry.value().is_empty() {
                return Some(Bytes::copy_from_slice(entry.value()));
            }
        }
        let value = self.storage.get(key)?;
        self.txn.lock().keys[i].value_entry = Some(ValueEntry {
            value: value.clone(),
        });
        Some(value)
    }

    fn insert(&self, key: Key, value: Bytes) -> bool {
        self.stage(&key, value)
    }

    fn update(&self, key: &Key, value: Option<Bytes>) -> bool {
        match value {
            Some(value) => self.stage(key, value),
            None => false,
        }
    }
}

/// Installs a committed transaction's staged writes into storage, for rows
/// whose partition is owned by this process.
pub fn apply_writes(txn: &Transaction, sharder: &Sharder, storage: &MemoryStorage) {
    for entry in &txn.keys {
        if entry.key_type() != KeyType::Write || entry.value().is_empty() {
            continue;
        }
        let key = Key::from_raw(entry.key.clone());
        if sharder.is_local_key(&key) {
            storage.put(key, Bytes::copy_from_slice(entry.value()), entry.home);
        }
    }
}
