use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the optional per-cache project config.
pub const PROJECT_CONFIG_FILE: &str = "sprintlog.toml";

/// Default cache directory written by the fetcher.
pub const DEFAULT_CACHE_DIR: &str = "issues";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub fields: FieldNames,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Names of the tracker fields the timeline depends on.
///
/// `sprint`, `estimate` and `status` are changelog field names; the
/// `*_field` entries are keys inside an issue document's `fields` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldNames {
    #[serde(default = "default_sprint")]
    pub sprint: String,
    #[serde(default = "default_estimate")]
    pub estimate: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_sprint_field")]
    pub sprint_field: String,
    #[serde(default = "default_estimate_field")]
    pub estimate_field: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            sprint: default_sprint(),
            estimate: default_estimate(),
            status: default_status(),
            sprint_field: default_sprint_field(),
            estimate_field: default_estimate_field(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_statuses")]
    pub statuses: Vec<String>,
    #[serde(default = "default_interval")]
    pub interval: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            statuses: default_statuses(),
            interval: default_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

fn default_sprint() -> String {
    "Sprint".to_string()
}

fn default_estimate() -> String {
    "Story Points".to_string()
}

fn default_status() -> String {
    "status".to_string()
}

fn default_sprint_field() -> String {
    "customfield_12310940".to_string()
}

fn default_estimate_field() -> String {
    "customfield_12310243".to_string()
}

fn default_statuses() -> Vec<String> {
    ["Backlog", "In Progress", "Review", "Testing", "Resolved", "Closed"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_interval() -> String {
    "daily".to_string()
}

/// Load `<cache_dir>/sprintlog.toml`, falling back to defaults when absent.
pub fn load_project_config(cache_dir: &Path) -> Result<ProjectConfig> {
    let path = cache_dir.join(PROJECT_CONFIG_FILE);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load `<config_dir>/sprintlog/config.toml`, falling back to defaults.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("sprintlog/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Whether `err` was caused by malformed TOML in a config file.
#[must_use]
pub fn is_parse_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<toml::de::Error>())
}

/// Pick the cache directory: explicit flag, then user config, then `issues`.
#[must_use]
pub fn resolve_cache_dir(cli_dir: Option<&Path>, user: &UserConfig) -> PathBuf {
    cli_dir
        .map(Path::to_path_buf)
        .or_else(|| user.cache_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR))
}
