use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{KeyValueStore, StoreError};
use crate::lock::{CollectionLock, DEFAULT_LOCK_TIMEOUT};

const LOCK_FILE: &str = ".lock";

/// Directory of `<key>.json` files guarded by one advisory lock file.
///
/// Each value is written to `<key>.json.tmp` and renamed into place, so a
/// reader never observes a half-written collection. Batches are renamed one
/// file at a time under the write lock and undone if a rename fails.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
    lock_timeout: Duration,
}

impl JsonDirStore {
    /// Open (or create) the store directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self {
            root,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        })
    }

    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    fn value_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::Io {
                path: self.root.join(key),
                source: io::Error::new(io::ErrorKind::InvalidInput, "invalid collection key"),
            });
        }
        Ok(self.root.join(format!("{key}.json")))
    }

    fn stage(&self, key: &str, value: &str) -> Result<(PathBuf, PathBuf), StoreError> {
        let path = self.value_path(key)?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value).map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        Ok((tmp_path, path))
    }
}

fn commit(tmp_path: &Path, path: &Path) -> Result<(), StoreError> {
    fs::rename(tmp_path, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_existing(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Put back what a partly applied batch replaced. `None` means the file did
/// not exist before the batch.
fn restore(replaced: &[(&Path, Option<String>)]) {
    for (path, previous) in replaced.iter().rev() {
        let outcome = match previous {
            Some(raw) => {
                let tmp_path = path.with_extension("json.tmp");
                fs::write(&tmp_path, raw).and_then(|()| fs::rename(&tmp_path, path))
            }
            None => fs::remove_file(path),
        };
        if let Err(err) = outcome {
            tracing::error!(path = %path.display(), %err, "collection file not restored");
        }
    }
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (tmp_path, _) in staged {
        let _ = fs::remove_file(tmp_path);
    }
}

impl KeyValueStore for JsonDirStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.value_path(key)?;
        let _lock = CollectionLock::shared(&self.lock_path(), self.lock_timeout)?;
        read_existing(&path)
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let _lock = CollectionLock::exclusive(&self.lock_path(), self.lock_timeout)?;
        let (tmp_path, path) = self.stage(key, &value)?;
        if let Err(err) = commit(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(err);
        }
        tracing::debug!(key, bytes = value.len(), "collection file written");
        Ok(())
    }

    /// Stages every file before renaming any. If a rename fails, the files
    /// already replaced get their previous contents back and no staged file
    /// is left behind.
    fn set_many(&mut self, entries: Vec<(&str, String)>) -> Result<(), StoreError> {
        let _lock = CollectionLock::exclusive(&self.lock_path(), self.lock_timeout)?;
        let mut staged = Vec::with_capacity(entries.len());
        for (key, value) in &entries {
            match self.stage(key, value) {
                Ok(paths) => staged.push(paths),
                Err(err) => {
                    discard(&staged);
                    return Err(err);
                }
            }
        }

        let mut replaced = Vec::with_capacity(staged.len());
        for (done, (tmp_path, path)) in staged.iter().enumerate() {
            let outcome = read_existing(path).and_then(|previous| {
                commit(tmp_path, path)?;
                Ok(previous)
            });
            match outcome {
                Ok(previous) => replaced.push((path.as_path(), previous)),
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        %err,
                        "batch write failed, rolling back"
                    );
                    restore(&replaced);
                    discard(&staged[done..]);
                    return Err(err);
                }
            }
        }
        tracing::debug!(keys = entries.len(), "collection files written together");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.value_path(key)?;
        let _lock = CollectionLock::exclusive(&self.lock_path(), self.lock_timeout)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tempfile::TempDir;

    #[test]
    fn values_persist_across_instances() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonDirStore::open(dir.path().join("data")).unwrap();
        store.set("wheelchairs", "[]".into()).unwrap();

        let reopened = JsonDirStore::open(dir.path().join("data")).unwrap();
        assert_eq!(reopened.get("wheelchairs").unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("data/wheelchairs.json").is_file());
        assert!(!dir.path().join("data/wheelchairs.json.tmp").exists());
    }

    #[test]
    fn missing_key_is_none_and_remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonDirStore::open(dir.path()).unwrap();
        assert_eq!(store.get("beneficiaries").unwrap(), None);
        store.remove("beneficiaries").unwrap();
    }

    #[test]
    fn set_many_writes_both_files() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonDirStore::open(dir.path()).unwrap();
        store
            .set_many(vec![
                ("beneficiaries", "[\"b\"]".into()),
                ("wheelchairs", "[\"w\"]".into()),
            ])
            .unwrap();
        assert_eq!(store.get("beneficiaries").unwrap().as_deref(), Some("[\"b\"]"));
        assert_eq!(store.get("wheelchairs").unwrap().as_deref(), Some("[\"w\"]"));
    }

    #[test]
    fn set_many_with_bad_key_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonDirStore::open(dir.path()).unwrap();
        store.set("wheelchairs", "[]".into()).unwrap();
        let err = store
            .set_many(vec![("wheelchairs", "[1]".into()), ("../escape", "[2]".into())])
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert_eq!(store.get("wheelchairs").unwrap().as_deref(), Some("[]"));
        assert!(!dir.path().join("wheelchairs.json.tmp").exists());
    }

    fn leftover_tmp_files(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.to_string_lossy().ends_with(".tmp"))
            .collect()
    }

    #[test]
    fn failed_rename_restores_earlier_collections() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonDirStore::open(dir.path()).unwrap();
        store.set("beneficiaries", "[\"before\"]".into()).unwrap();
        // a directory in place of the file makes the second write fail
        fs::create_dir(dir.path().join("wheelchairs.json")).unwrap();

        let err = store
            .set_many(vec![
                ("beneficiaries", "[\"after\"]".into()),
                ("wheelchairs", "[]".into()),
            ])
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::StoreWriteFailed);
        assert_eq!(store.get("beneficiaries").unwrap().as_deref(), Some("[\"before\"]"));
        assert!(leftover_tmp_files(dir.path()).is_empty());
    }

    #[test]
    fn failed_batch_removes_files_it_created() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonDirStore::open(dir.path()).unwrap();
        fs::create_dir(dir.path().join("wheelchairs.json")).unwrap();

        store
            .set_many(vec![("beneficiaries", "[]".into()), ("wheelchairs", "[]".into())])
            .unwrap_err();
        assert_eq!(store.get("beneficiaries").unwrap(), None);
        assert!(!dir.path().join("beneficiaries.json").exists());
        assert!(leftover_tmp_files(dir.path()).is_empty());
    }

    #[test]
    fn held_write_lock_reports_contention() {
        let dir = TempDir::new().unwrap();
        let store = JsonDirStore::open(dir.path())
            .unwrap()
            .with_lock_timeout(Duration::from_millis(20));
        let _held =
            CollectionLock::exclusive(&store.lock_path(), Duration::from_millis(50)).unwrap();
        let err = store.get("wheelchairs").unwrap_err();
        assert_eq!(err.code(), ErrorCode::LockContention);
    }
}
