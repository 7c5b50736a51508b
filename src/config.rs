use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// =============================================================================
// Defaults
// =============================================================================

/// Default number of concurrent registry workers
pub const DEFAULT_MAX_WORKERS: usize = 10;

/// Timeout for a single registry request in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Fraction of a scope's total lag the hotpath has to cover
pub const DEFAULT_HOTPATH_THRESHOLD: f64 = 0.5;

/// Number of entries in a hotpath's top contributors view
pub const TOP_CONTRIBUTORS: usize = 10;

/// deps.dev v3 API
pub const DEFAULT_REGISTRY_URL: &str = "https://api.deps.dev/v3";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Analysis configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Size of the registry worker pool
    pub max_workers: usize,
    /// Per-request registry timeout in milliseconds
    pub fetch_timeout_ms: u64,
    /// Hotpath coverage threshold, a fraction in (0, 1]
    pub hotpath_threshold: f64,
    pub registry: RegistryConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            fetch_timeout_ms: FETCH_TIMEOUT_MS,
            hotpath_threshold: DEFAULT_HOTPATH_THRESHOLD,
            registry: RegistryConfig::default(),
        }
    }
}

/// Version registry configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    pub base_url: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REGISTRY_URL.to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `explicit` if given, otherwise the user config file if it exists,
    /// otherwise the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let default_path = config_path();
        if default_path.is_file() {
            return Self::from_file(&default_path);
        }

        Ok(Self::default())
    }

    /// Replaces out-of-range values with their defaults.
    pub fn normalized(mut self) -> Self {
        if self.max_workers == 0 {
            self.max_workers = DEFAULT_MAX_WORKERS;
        }
        if self.fetch_timeout_ms == 0 {
            self.fetch_timeout_ms = FETCH_TIMEOUT_MS;
        }
        if !(self.hotpath_threshold > 0.0 && self.hotpath_threshold <= 1.0) {
            self.hotpath_threshold = DEFAULT_HOTPATH_THRESHOLD;
        }
        if self.registry.base_url.trim().is_empty() {
            self.registry.base_url = DEFAULT_REGISTRY_URL.to_string();
        }
        self
    }
}

/// Returns the path to the user config file.
/// Uses $XDG_CONFIG_HOME/techlag/config.json if XDG_CONFIG_HOME is set,
/// otherwise falls back to ~/.config/techlag/config.json,
/// or ./techlag/config.json if neither is available.
pub fn config_path() -> PathBuf {
    config_path_with_env(std::env::var("XDG_CONFIG_HOME").ok(), dirs::home_dir())
}

fn config_path_with_env(xdg_config_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let config_dir = xdg_config_home
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));

    config_dir.join("techlag").join("config.json")
}
