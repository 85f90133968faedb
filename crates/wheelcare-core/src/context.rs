//! Wiring from a project directory to a ready [`Api`].

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::api::Api;
use crate::clock::SystemClock;
use crate::config::{Backend, PROJECT_DIR, ProjectConfig, StorageConfig};
use crate::i18n::Locale;
use crate::service::Database;
use crate::store::{JsonDirStore, KeyValueStore, MemoryStore, SqliteStore};

/// Walk up from `start` to the nearest directory containing `.wheelcare/`.
#[must_use]
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(PROJECT_DIR).is_dir())
        .map(Path::to_path_buf)
}

/// Open the store configured for the project at `root`.
///
/// # Errors
///
/// Returns an error if the backend cannot be opened.
pub fn open_store(root: &Path, storage: &StorageConfig) -> Result<Box<dyn KeyValueStore>> {
    let project_dir = root.join(PROJECT_DIR);
    let path = storage.resolved_path(&project_dir);
    let store: Box<dyn KeyValueStore> = match storage.backend {
        Backend::Sqlite => Box::new(
            SqliteStore::open(&path)
                .with_context(|| format!("Failed to open sqlite store {}", path.display()))?,
        ),
        Backend::Json => Box::new(
            JsonDirStore::open(&path)
                .with_context(|| format!("Failed to open json store {}", path.display()))?,
        ),
        Backend::Memory => Box::new(MemoryStore::new()),
    };
    tracing::debug!(backend = ?storage.backend, path = %path.display(), "store opened");
    Ok(store)
}

/// Build the adapter layer for a project: store, database and page limits.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or holds corrupt data.
pub fn open_api(root: &Path, config: &ProjectConfig, locale: Locale) -> Result<Api> {
    let store = open_store(root, &config.storage)?;
    let db = Database::open(store, SystemClock).context("Failed to load registry collections")?;
    Ok(Api::new(db, locale).with_limits(config.pagination.limits()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::write_default_project_config;
    use crate::validate::WheelchairForm;
    use tempfile::TempDir;

    fn form() -> WheelchairForm {
        WheelchairForm {
            kind: Some("manual".into()),
            condition: Some("good".into()),
            source: Some("purchase".into()),
            ..WheelchairForm::default()
        }
    }

    #[test]
    fn finds_root_from_nested_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".wheelcare")).unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_project_root(&nested).as_deref(), Some(dir.path()));
    }

    #[test]
    fn records_survive_reopen_for_both_disk_backends() {
        for backend in [Backend::Sqlite, Backend::Json] {
            let dir = TempDir::new().unwrap();
            write_default_project_config(dir.path(), backend).unwrap();
            let config = ProjectConfig {
                storage: StorageConfig {
                    backend,
                    path: None,
                },
                ..ProjectConfig::default()
            };

            let id = {
                let mut api = open_api(dir.path(), &config, Locale::En).unwrap();
                api.create_wheelchair(&form()).into_result().unwrap().id
            };
            let mut api = open_api(dir.path(), &config, Locale::En).unwrap();
            let whc = api.get_wheelchair(&id).into_result().unwrap();
            assert_eq!(whc.id, id, "backend {backend:?}");
        }
    }

    #[test]
    fn memory_backend_starts_empty_every_time() {
        let dir = TempDir::new().unwrap();
        let config = ProjectConfig {
            storage: StorageConfig {
                backend: Backend::Memory,
                path: None,
            },
            ..ProjectConfig::default()
        };
        let mut api = open_api(dir.path(), &config, Locale::En).unwrap();
        assert!(api.create_wheelchair(&form()).success);
        let mut api = open_api(dir.path(), &config, Locale::En).unwrap();
        assert_eq!(api.wheelchair_stats().data.unwrap().total, 0);
    }
}
