//! Settings loaded from `braggard.toml`.
//!
//! The file is looked up once at process start and the resulting [`Config`]
//! is handed to each stage explicitly. Every table and key is optional.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const CONFIG_FILE_NAME: &str = "braggard.toml";
pub const DEFAULT_ENDPOINT: &str = "https://api.github.com/graphql";

/// Settings under the `[user]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub handle: Option<String>,
    pub include_private: bool,
}

/// Settings under the `[metrics]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub ci_pass_window: u32,
    pub commit_history_years: u32,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            ci_pass_window: 100,
            commit_history_years: 3,
        }
    }
}

/// Settings under the `[paths]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub summary_path: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            summary_path: PathBuf::from("summary.json"),
            output_dir: PathBuf::from("docs"),
        }
    }
}

/// Settings under the `[api]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Upper bound on concurrent secondary queries; derived from the CPU
    /// count when unset
    pub concurrency: Option<usize>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 30,
            concurrency: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub user: UserConfig,
    pub metrics: MetricsConfig,
    pub paths: PathsConfig,
    pub api: ApiConfig,
}

impl Config {
    /// Load settings from the first config file found.
    ///
    /// Search order:
    /// 1. `explicit` when provided (it must exist)
    /// 2. `./braggard.toml`
    /// 3. `$XDG_CONFIG_HOME/braggard/braggard.toml`, or
    ///    `~/.config/braggard/braggard.toml` when `XDG_CONFIG_HOME` is unset
    ///
    /// Falls back to [`Config::default`] when no file exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        for candidate in search_paths() {
            if candidate.is_file() {
                return Self::load_from(&candidate);
            }
        }

        log::debug!("no {} found, using defaults", CONFIG_FILE_NAME);
        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// The configured account handle, ignoring blank values.
    pub fn handle(&self) -> Option<&str> {
        self.user
            .handle
            .as_deref()
            .map(str::trim)
            .filter(|handle| !handle.is_empty())
    }
}

/// Candidate config locations after an explicit path, in lookup order.
pub fn search_paths() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME)];

    let config_home = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")));
    if let Some(config_home) = config_home {
        candidates.push(config_home.join("braggard").join(CONFIG_FILE_NAME));
    }

    candidates
}
