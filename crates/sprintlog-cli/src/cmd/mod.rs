pub mod completions;
pub mod members;
pub mod track;
pub mod windows;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sprintlog_core::cache::DirCache;
use sprintlog_core::config::{ProjectConfig, load_project_config, load_user_config, resolve_cache_dir};
use tracing::debug;

/// Cache directory and the config layered over it.
#[derive(Debug)]
pub struct Workspace {
    pub dir: PathBuf,
    pub config: ProjectConfig,
}

impl Workspace {
    /// Resolve the cache directory and load its config files.
    pub fn load(dir_flag: Option<&Path>) -> Result<Self> {
        let user = load_user_config()?;
        let dir = resolve_cache_dir(dir_flag, &user);
        let config = load_project_config(&dir)?;
        debug!("cache dir {}", dir.display());
        Ok(Self { dir, config })
    }

    /// Open the cache directory for reading.
    pub fn open_cache(&self) -> Result<DirCache> {
        DirCache::open(&self.dir, self.config.fields.clone())
            .with_context(|| format!("cannot open cache directory {}", self.dir.display()))
    }
}

/// Treat an empty flag value the same as an absent one.
pub fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
