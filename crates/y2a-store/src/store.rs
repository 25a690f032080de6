//! redb-backed collection store.
//!
//! Each collection is a redb table of `&str -> &[u8]`. A single call runs in
//! its own redb transaction, so a save either fully lands or not at all.
//! Nothing here spans calls: a load followed by a save of the same key is
//! two transactions and can interleave with other writers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};
use tracing::{debug, info};

use crate::collections::DEFAULT_COLLECTIONS;
use crate::error::{db_err, StoreError, StoreResult};
use crate::record::Record;

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the database file
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./y2a.redb"),
        }
    }
}

impl StoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            path: std::env::var("STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./y2a.redb")),
        }
    }
}

fn table(name: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(name)
}

/// Durable keyed storage over a fixed set of collections.
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
    collections: Arc<[String]>,
}

impl Store {
    /// Open (or create) the store with the default collections.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        Self::open_with(&config.path, DEFAULT_COLLECTIONS)
    }

    /// Open (or create) the store, declaring `collections` up front.
    pub fn open_with(path: impl AsRef<Path>, collections: &[&str]) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(path).map_err(db_err)?;

        let txn = db.begin_write().map_err(db_err)?;
        for name in collections {
            txn.open_table(table(name)).map_err(db_err)?;
        }
        txn.commit().map_err(db_err)?;

        info!(
            "Opened store at {} with collections {:?}",
            path.display(),
            collections
        );

        Ok(Self {
            db: Arc::new(db),
            collections: collections.iter().map(|c| c.to_string()).collect(),
        })
    }

    /// Declared collection names.
    pub fn collections(&self) -> impl Iterator<Item = &str> {
        self.collections.iter().map(String::as_str)
    }

    fn check_collection(&self, collection: &str) -> StoreResult<()> {
        if self.collections.iter().any(|c| c == collection) {
            Ok(())
        } else {
            Err(StoreError::UnknownCollection(collection.to_string()))
        }
    }

    /// Load the raw bytes stored under `key`.
    pub fn load_raw(&self, collection: &str, key: &str) -> StoreResult<Vec<u8>> {
        self.check_collection(collection)?;

        let txn = self.db.begin_read().map_err(db_err)?;
        let table = txn.open_table(table(collection)).map_err(db_err)?;
        let value = table.get(key).map_err(db_err)?;

        match value {
            Some(guard) => Ok(guard.value().to_vec()),
            None => Err(StoreError::not_found(collection, key)),
        }
    }

    /// Store raw bytes under `key`, overwriting any previous value.
    pub fn save_raw(&self, collection: &str, key: &str, bytes: &[u8]) -> StoreResult<()> {
        self.check_collection(collection)?;

        let txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = txn.open_table(table(collection)).map_err(db_err)?;
            table.insert(key, bytes).map_err(db_err)?;
        }
        txn.commit().map_err(db_err)?;

        debug!(collection, key, bytes = bytes.len(), "Saved record");
        Ok(())
    }

    /// Remove `key`. Removing a missing key succeeds.
    pub fn delete(&self, collection: &str, key: &str) -> StoreResult<()> {
        self.check_collection(collection)?;

        let txn = self.db.begin_write().map_err(db_err)?;
        let existed = {
            let mut table = txn.open_table(table(collection)).map_err(db_err)?;
            let removed = table.remove(key).map_err(db_err)?;
            removed.is_some()
        };
        txn.commit().map_err(db_err)?;

        debug!(collection, key, existed, "Deleted record");
        Ok(())
    }

    /// Load and decode a record.
    pub fn load<T: Record>(&self, collection: &str, key: &str) -> StoreResult<T> {
        let bytes = self.load_raw(collection, key)?;
        T::decode(&bytes).map_err(|source| StoreError::Decode {
            collection: collection.to_string(),
            key: key.to_string(),
            source,
        })
    }

    /// Load a record, mapping a missing key to `None`.
    pub fn find<T: Record>(&self, collection: &str, key: &str) -> StoreResult<Option<T>> {
        match self.load(collection, key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Encode and save a record (last writer wins).
    pub fn save<T: Record>(&self, collection: &str, key: &str, value: &T) -> StoreResult<()> {
        let bytes = value.encode().map_err(|source| StoreError::Encode {
            collection: collection.to_string(),
            key: key.to_string(),
            source,
        })?;
        self.save_raw(collection, key, &bytes)
    }

    /// All keys of a collection, in key order.
    pub fn keys(&self, collection: &str) -> StoreResult<Vec<String>> {
        self.check_collection(collection)?;

        let txn = self.db.begin_read().map_err(db_err)?;
        let table = txn.open_table(table(collection)).map_err(db_err)?;

        let mut keys = Vec::new();
        for entry in table.iter().map_err(db_err)? {
            let (key, _) = entry.map_err(db_err)?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::{HISTORY, JOBS, USERS};

    fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_with(dir.path().join("test.redb"), DEFAULT_COLLECTIONS).unwrap();
        (dir, store)
    }

    #[test]
    fn test_raw_roundtrip_and_overwrite() {
        let (_dir, store) = temp_store();
        store.save_raw(JOBS, "k", b"one").unwrap();
        store.save_raw(JOBS, "k", b"two").unwrap();
        assert_eq!(store.load_raw(JOBS, "k").unwrap(), b"two");
    }

    #[test]
    fn test_collections_are_separate_keyspaces() {
        let (_dir, store) = temp_store();
        store.save_raw(JOBS, "k", b"job").unwrap();
        assert!(store.load_raw(HISTORY, "k").unwrap_err().is_not_found());
    }

    #[test]
    fn test_unknown_collection_is_rejected() {
        let (_dir, store) = temp_store();
        assert!(matches!(
            store.save_raw("stats", "k", b"x"),
            Err(StoreError::UnknownCollection(name)) if name == "stats"
        ));
        assert!(matches!(
            store.load_raw("stats", "k"),
            Err(StoreError::UnknownCollection(_))
        ));
        assert!(matches!(
            store.delete("stats", "k"),
            Err(StoreError::UnknownCollection(_))
        ));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (_dir, store) = temp_store();
        store.save_raw(USERS, "alice", b"{}").unwrap();
        store.delete(USERS, "alice").unwrap();
        store.delete(USERS, "alice").unwrap();
        assert!(store.keys(USERS).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_bytes_surface_as_decode_error() {
        let (_dir, store) = temp_store();
        store.save_raw(USERS, "alice", b"not json").unwrap();
        let err = store.load::<y2a_models::User>(USERS, "alice").unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[test]
    fn test_keys_are_ordered() {
        let (_dir, store) = temp_store();
        for key in ["b", "c", "a"] {
            store.save_raw(JOBS, key, b"x").unwrap();
        }
        assert_eq!(store.keys(JOBS).unwrap(), vec!["a", "b", "c"]);
    }
}
