//! Persistence façade.
//!
//! The registry persists through a string-keyed, string-valued store: each
//! collection is one key holding a JSON array, read in full and written in
//! full on every mutation. Backends:
//!
//! - [`MemoryStore`]: a `HashMap`, for tests and throwaway sessions
//! - [`JsonDirStore`]: one `<key>.json` file per collection behind an
//!   advisory lock
//! - [`SqliteStore`]: a single `kv` table; multi-key writes share one
//!   transaction
//!
//! [`Collection`] holds the rehydrated records of one key in memory.

pub mod json_dir;
pub mod memory;
pub mod sqlite;

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::PathBuf;

use crate::error::ErrorCode;
use crate::lock::LockError;

pub use json_dir::JsonDirStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Failures of the persistence boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sqlite store failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("collection '{key}' holds invalid JSON: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode collection '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } | Self::Sqlite(_) | Self::Encode { .. } => ErrorCode::StoreWriteFailed,
            Self::Lock(err) => err.code(),
            Self::Corrupt { .. } => ErrorCode::CorruptStore,
        }
    }
}

/// String-keyed, string-valued persistence boundary.
pub trait KeyValueStore {
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;

    /// Write several keys together. Backends that can make this all-or-nothing
    /// do so; the default writes one key after the other.
    ///
    /// # Errors
    ///
    /// Returns an error if any write fails.
    fn set_many(&mut self, entries: Vec<(&str, String)>) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn set_many(&mut self, entries: Vec<(&str, String)>) -> Result<(), StoreError> {
        (**self).set_many(entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// A record type persisted as one collection.
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Store key of the collection.
    const COLLECTION: &'static str;
    /// Prefix of generated ids (`whc`, `ben`).
    const ID_PREFIX: &'static str;

    fn id(&self) -> &str;
}

/// In-memory copy of one persisted collection, kept in insertion order.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    rows: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<T: Record> Collection<T> {
    /// Rehydrate from the store; a missing key is an empty collection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] if the stored value is not a JSON array
    /// of `T`.
    pub fn load(store: &dyn KeyValueStore) -> Result<Self, StoreError> {
        let Some(raw) = store.get(T::COLLECTION)? else {
            tracing::debug!(collection = T::COLLECTION, "collection absent, starting empty");
            return Ok(Self::default());
        };
        let rows: Vec<T> = serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            key: T::COLLECTION.to_string(),
            source,
        })?;
        tracing::debug!(collection = T::COLLECTION, rows = rows.len(), "collection loaded");
        Ok(Self { rows })
    }

    #[must_use]
    pub fn all(&self) -> &[T] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.rows.iter().position(|row| row.id() == id)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&T> {
        self.rows.iter().find(|row| row.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn insert(&mut self, record: T) {
        self.rows.push(record);
    }

    /// Replace the record with the same id; returns `false` if none exists.
    pub fn replace(&mut self, record: T) -> bool {
        match self.position(record.id()) {
            Some(index) => {
                self.rows[index] = record;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        self.position(id).map(|index| self.rows.remove(index))
    }

    /// Serialize the whole collection for writing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Encode`] if a record cannot be serialized.
    pub fn encode(&self) -> Result<String, StoreError> {
        serde_json::to_string(&self.rows).map_err(|source| StoreError::Encode {
            key: T::COLLECTION.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        body: String,
    }

    impl Record for Note {
        const COLLECTION: &'static str = "notes";
        const ID_PREFIX: &'static str = "note";

        fn id(&self) -> &str {
            &self.id
        }
    }

    fn note(id: &str, body: &str) -> Note {
        Note {
            id: id.into(),
            body: body.into(),
        }
    }

    #[test]
    fn missing_key_loads_empty() {
        let store = MemoryStore::default();
        let notes = Collection::<Note>::load(&store).unwrap();
        assert!(notes.is_empty());
    }

    #[test]
    fn corrupt_value_is_reported_with_key() {
        let mut store = MemoryStore::default();
        store.set("notes", "{not json".into()).unwrap();
        let err = Collection::<Note>::load(&store).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { ref key, .. } if key == "notes"));
        assert_eq!(err.code(), ErrorCode::CorruptStore);
    }

    #[test]
    fn encode_then_load_preserves_order() {
        let mut notes = Collection::default();
        notes.insert(note("b", "second"));
        notes.insert(note("a", "first"));

        let mut store = MemoryStore::default();
        store.set("notes", notes.encode().unwrap()).unwrap();
        let loaded = Collection::<Note>::load(&store).unwrap();
        assert_eq!(loaded.all(), notes.all());
        assert_eq!(loaded.position("a"), Some(1));
    }

    #[test]
    fn replace_and_remove_by_id() {
        let mut notes = Collection::default();
        notes.insert(note("a", "first"));
        assert!(notes.replace(note("a", "edited")));
        assert!(!notes.replace(note("z", "ghost")));
        assert_eq!(notes.get("a").map(|n| n.body.as_str()), Some("edited"));
        assert_eq!(notes.remove("a"), Some(note("a", "edited")));
        assert!(notes.remove("a").is_none());
    }
}
