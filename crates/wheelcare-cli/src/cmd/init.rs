use anyhow::{Context as _, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;
use std::path::Path;
use tracing::info;
use wheelcare_core::Envelope;
use wheelcare_core::config::{Backend, PROJECT_DIR, resolve_config, write_default_project_config};

use super::Settings;
use crate::output::{OutputMode, pretty_kv, render_envelope};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Storage backend recorded in the new config.
    #[arg(long, value_enum, default_value_t = BackendArg::Sqlite)]
    pub backend: BackendArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    /// One SQLite database file.
    Sqlite,
    /// One JSON file per collection.
    Json,
    /// Nothing persisted; every command starts empty.
    Memory,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Sqlite => Self::Sqlite,
            BackendArg::Json => Self::Json,
            BackendArg::Memory => Self::Memory,
        }
    }
}

const GITIGNORE: &str = "data.sqlite3\ndata.sqlite3-*\ndata/\n*.lock\n";

#[derive(Debug, Serialize)]
struct Initialized {
    config: String,
    backend: Backend,
}

/// Execute `wheelcare init`. Creates the project skeleton:
///
/// ```text
/// .wheelcare/
///   config.toml   (storage, pagination and locale defaults)
///   .gitignore    (data files)
/// ```
///
/// # Errors
///
/// Returns an error if `.wheelcare/config.toml` already exists or any
/// filesystem operation fails.
pub fn run_init(args: &InitArgs, settings: &Settings, project_root: &Path) -> Result<bool> {
    let backend = Backend::from(args.backend);
    let config_path = write_default_project_config(project_root, backend)?;

    let gitignore_path = project_root.join(PROJECT_DIR).join(".gitignore");
    std::fs::write(&gitignore_path, GITIGNORE)
        .with_context(|| format!("Failed to write .gitignore: {}", gitignore_path.display()))?;
    info!(path = %config_path.display(), ?backend, "initialized project");

    let effective = resolve_config(project_root, settings.json, settings.locale.as_deref())?;
    let mode = OutputMode::parse(&effective.resolved_output);
    let envelope = Envelope::success(Initialized {
        config: config_path.display().to_string(),
        backend,
    });
    render_envelope(mode, "Initialized", &envelope, |done, w| {
        pretty_kv(w, "config", &done.config)?;
        pretty_kv(w, "backend", format!("{:?}", done.backend).to_lowercase())?;
        writeln!(w)?;
        writeln!(w, "Next steps:")?;
        writeln!(
            w,
            "  wheelcare wheelchair create --type standard --condition good --source donation"
        )?;
        writeln!(w, "  wheelcare beneficiary create --first-name Aisha --last-name K")
    })
}
