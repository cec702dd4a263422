//! Minimal key-value contract shared by the metadata store and the KV-backed ledger.

use std::{collections::HashMap, fmt::Debug, sync::Arc};

use parking_lot::RwLock;

use crate::KvError;

/// Point reads and writes against the node's key-value database.
///
/// The storage engine itself lives outside this crate; anything that can serve `get`/`put` on raw
/// byte keys can back the metadata store.
pub trait KeyValueStore: Debug + Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), KvError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError> {
        (**self).get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), KvError> {
        (**self).put(key, value)
    }
}

/// Volatile [`KeyValueStore`] used by tests and tooling.
#[derive(Debug, Default)]
pub struct MemoryKv {
    inner: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryKv {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored keys.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError> {
        Ok(self.inner.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), KvError> {
        self.inner.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}
