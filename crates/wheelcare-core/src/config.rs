use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::api::{DEFAULT_MAX_LIMIT, PageLimits};
use crate::i18n::Locale;
use crate::page::DEFAULT_PAGE_LIMIT;

/// Directory holding a project's config and data.
pub const PROJECT_DIR: &str = ".wheelcare";
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub locale: LocaleConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    Json,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: Backend,
    /// Relative paths resolve against the project directory. Unset means
    /// `data.sqlite3` or `data/` depending on the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Sqlite,
            path: None,
        }
    }
}

impl StorageConfig {
    #[must_use]
    pub fn resolved_path(&self, project_dir: &Path) -> PathBuf {
        let path = self.path.clone().unwrap_or_else(|| match self.backend {
            Backend::Sqlite => PathBuf::from("data.sqlite3"),
            Backend::Json | Backend::Memory => PathBuf::from("data"),
        });
        if path.is_absolute() {
            path
        } else {
            project_dir.join(path)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    #[serde(default = "default_limit")]
    pub default_limit: u32,
    #[serde(default = "max_limit")]
    pub max_limit: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: max_limit(),
        }
    }
}

impl PaginationConfig {
    #[must_use]
    pub fn limits(self) -> PageLimits {
        let max_limit = self.max_limit.max(1);
        PageLimits {
            default_limit: self.default_limit.clamp(1, max_limit),
            max_limit,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleConfig {
    #[serde(default)]
    pub default: Locale,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub locale: Locale,
    pub resolved_output: String,
}

/// Read `<root>/.wheelcare/config.toml`; a missing file means defaults.
///
/// # Errors
///
/// Returns an error naming the file if it cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(PROJECT_DIR).join(CONFIG_FILE);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// # Errors
///
/// Returns an error naming the file if it cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("wheelcare").join(CONFIG_FILE);
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Merge project and user config with the command line and environment.
///
/// # Errors
///
/// Returns an error if a config file is unreadable or a locale is unsupported.
pub fn resolve_config(
    project_root: &Path,
    cli_json: bool,
    cli_locale: Option<&str>,
) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_locale = env::var("WHEELCARE_LOCALE").ok();
    let locale = resolve_locale(
        cli_locale,
        env_locale.as_deref(),
        user.locale.as_deref(),
        project.locale.default,
    )?;

    let env_format = env::var("WHEELCARE_FORMAT").ok();
    let resolved_output = resolve_output(cli_json, user.output.clone(), env_format);

    Ok(EffectiveConfig {
        project,
        user,
        locale,
        resolved_output,
    })
}

fn resolve_locale(
    cli: Option<&str>,
    env: Option<&str>,
    user: Option<&str>,
    project: Locale,
) -> Result<Locale> {
    if let Some(raw) = cli {
        return raw
            .parse()
            .with_context(|| format!("Invalid --locale value '{raw}'"));
    }

    // an unusable environment or user value falls through
    for raw in [env, user].into_iter().flatten() {
        if raw.trim().is_empty() {
            continue;
        }
        match raw.parse() {
            Ok(locale) => return Ok(locale),
            Err(err) => tracing::warn!(%err, "ignoring configured locale"),
        }
    }

    Ok(project)
}

fn resolve_output(
    cli_json: bool,
    user_output: Option<String>,
    env_format: Option<String>,
) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some("pretty"),
            "text" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

/// Write a default project config, refusing to replace an existing one.
///
/// # Errors
///
/// Returns an error if the config exists or cannot be written.
pub fn write_default_project_config(project_root: &Path, backend: Backend) -> Result<PathBuf> {
    let dir = project_root.join(PROJECT_DIR);
    let path = dir.join(CONFIG_FILE);
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let config = ProjectConfig {
        storage: StorageConfig {
            backend,
            path: None,
        },
        ..ProjectConfig::default()
    };
    let content = toml::to_string_pretty(&config).context("Failed to encode default config")?;
    std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

const fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

const fn max_limit() -> u32 {
    DEFAULT_MAX_LIMIT
}
