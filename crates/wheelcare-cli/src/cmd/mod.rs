pub mod beneficiary;
pub mod completions;
pub mod init;
pub mod wheelchair;

use anyhow::{Result, anyhow};
use clap::Args;
use std::path::Path;
use tracing::debug;
use wheelcare_core::Api;
use wheelcare_core::api::ListQuery;
use wheelcare_core::config::resolve_config;
use wheelcare_core::context::{find_project_root, open_api};

use crate::output::OutputMode;

/// Global flags every command sees.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub json: bool,
    pub locale: Option<String>,
}

/// An opened project: the adapter layer plus the resolved output mode.
pub struct Session {
    pub api: Api,
    pub mode: OutputMode,
}

impl Session {
    /// Locate the project above `cwd`, resolve its config and open the store.
    ///
    /// # Errors
    ///
    /// Returns an error if no project is found, config is invalid, or the
    /// store cannot be opened.
    pub fn open(cwd: &Path, settings: &Settings) -> Result<Self> {
        let root = find_project_root(cwd).ok_or_else(|| {
            anyhow!(
                "No .wheelcare/ project found in {} or its parents. Run `wheelcare init` first.",
                cwd.display()
            )
        })?;
        let config = resolve_config(&root, settings.json, settings.locale.as_deref())?;
        debug!(root = %root.display(), locale = config.locale.as_str(), "opening project");
        let api = open_api(&root, &config.project, config.locale)?;
        Ok(Self {
            api,
            mode: OutputMode::parse(&config.resolved_output),
        })
    }
}

/// Paging and filter flags shared by both `list` commands.
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// 1-based page number.
    #[arg(long, allow_negative_numbers = true)]
    pub page: Option<i64>,

    /// Rows per page, capped by the project's `max_limit`.
    #[arg(long, allow_negative_numbers = true)]
    pub limit: Option<i64>,

    /// Only show records with this status.
    #[arg(long)]
    pub status: Option<String>,
}

impl ListArgs {
    pub fn query(&self) -> ListQuery {
        ListQuery {
            page: self.page,
            limit: self.limit,
            status: self.status.clone(),
        }
    }
}
