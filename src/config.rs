// Configuration loading

use crate::models::Priority;
use crate::view::{SortOrder, TaskFilter};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// User configuration, read from `config.yaml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Directory holding the persisted task state
    pub store_path: PathBuf,
    pub default_priority: Priority,
    pub default_filter: TaskFilter,
    pub default_sort: SortOrder,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            default_priority: Priority::default(),
            default_filter: TaskFilter::default(),
            default_sort: SortOrder::default(),
        }
    }
}

impl Config {
    /// Load from an explicit file, or the default location if `path` is None
    ///
    /// A missing file yields defaults; an unreadable or malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) => p,
                None => {
                    debug!("No config directory available, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            debug!(path = ?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).context(format!("Failed to read config file {}", path.display()))?;
        let config: Config =
            serde_yaml::from_str(&content).context(format!("Failed to parse config file {}", path.display()))?;

        info!(path = ?path, "Loaded config");
        Ok(config)
    }
}

/// `<config dir>/taskflow/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("taskflow").join("config.yaml"))
}

/// `<data dir>/taskflow`, or `./.taskflow` when there is no data dir
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("taskflow"))
        .unwrap_or_else(|| PathBuf::from(".taskflow"))
}
