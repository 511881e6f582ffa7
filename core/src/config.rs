//! Configuration loading
//!
//! Priority order (highest to lowest):
//! 1. Explicit config file via the OPSDESK_CONFIG env var
//! 2. Local config file (opsdesk.toml) in the workspace directory
//! 3. Built-in defaults

use crate::error::{OpsdeskError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "opsdesk.toml";
pub const CONFIG_ENV_VAR: &str = "OPSDESK_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the database file and the active snapshot handle
    pub workspace_dir: PathBuf,
    /// Database file name inside the workspace directory
    pub database: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            workspace_dir: PathBuf::from(".opsdesk"),
            database: "opsdesk.duckdb".to_string(),
        }
    }
}

impl Config {
    /// Absolute-ish path to the database file, resolved against `root` when
    /// the configured workspace directory is relative.
    pub fn database_path(&self, root: &Path) -> PathBuf {
        self.resolved_workspace(root).join(&self.storage.database)
    }

    /// Path where the CLI persists the active snapshot between invocations
    pub fn snapshot_path(&self, root: &Path) -> PathBuf {
        self.resolved_workspace(root).join("snapshot.json")
    }

    fn resolved_workspace(&self, root: &Path) -> PathBuf {
        if self.storage.workspace_dir.is_relative() {
            root.join(&self.storage.workspace_dir)
        } else {
            self.storage.workspace_dir.clone()
        }
    }
}

/// Load configuration for a workspace rooted at `root`.
pub fn get_config(root: &Path) -> Result<Config> {
    if let Ok(path) = env::var(CONFIG_ENV_VAR) {
        let content = fs::read_to_string(&path)
            .map_err(|e| OpsdeskError::config(format!("cannot read {path}: {e}")))?;
        return parse(&content, &path);
    }

    let local = root.join(CONFIG_FILE_NAME);
    if local.exists() {
        let content = fs::read_to_string(&local)?;
        return parse(&content, &local.to_string_lossy());
    }

    Ok(Config::default())
}

fn parse(content: &str, origin: &str) -> Result<Config> {
    toml::from_str(content).map_err(|e| OpsdeskError::config(format!("invalid {origin}: {e}")))
}
