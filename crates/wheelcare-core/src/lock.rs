//! Advisory locking for the JSON collection directory.
//!
//! Readers take the lock shared, writers exclusive. The lock is released when
//! the guard drops. Acquisition polls until `timeout` and then reports
//! [`LockError::Timeout`] (E5002) instead of blocking forever.

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::ErrorCode;

/// Default wait before giving up on a contended store lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

const POLL_START: Duration = Duration::from_millis(5);
const POLL_MAX: Duration = Duration::from_millis(80);

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error(
        "{}: store lock {} still held after {waited:?}",
        ErrorCode::LockContention.code(),
        path.display()
    )]
    Timeout { path: PathBuf, waited: Duration },

    #[error(
        "{}: cannot open lock file {}: {source}",
        ErrorCode::StoreWriteFailed.code(),
        path.display()
    )]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LockError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::Io { .. } => ErrorCode::StoreWriteFailed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Shared,
    Exclusive,
}

/// Held advisory lock on the collection directory's lock file.
#[derive(Debug)]
pub struct CollectionLock {
    file: File,
    access: Access,
}

impl CollectionLock {
    /// Lock for reading; any number of readers may hold it together.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Timeout`] if a writer holds the lock past `timeout`.
    pub fn shared(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Self::acquire(path, timeout, Access::Shared)
    }

    /// Lock for replacing collection files.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Timeout`] if any other holder keeps the lock past
    /// `timeout`.
    pub fn exclusive(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Self::acquire(path, timeout, Access::Exclusive)
    }

    #[must_use]
    pub fn is_exclusive(&self) -> bool {
        self.access == Access::Exclusive
    }

    fn acquire(path: &Path, timeout: Duration, access: Access) -> Result<Self, LockError> {
        let io_err = |source| LockError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(io_err)?;

        let started = Instant::now();
        let mut pause = POLL_START;
        loop {
            // std::fs::File has inherent lock methods with other signatures
            let locked = match access {
                Access::Shared => FileExt::try_lock_shared(&file).is_ok(),
                Access::Exclusive => FileExt::try_lock_exclusive(&file).is_ok(),
            };
            if locked {
                return Ok(Self { file, access });
            }
            let waited = started.elapsed();
            if waited >= timeout {
                tracing::warn!(path = %path.display(), ?waited, "store lock contended");
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited,
                });
            }
            thread::sleep(pause.min(timeout.saturating_sub(waited)));
            pause = (pause * 2).min(POLL_MAX);
        }
    }
}

impl Drop for CollectionLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
