//! Configuration loading for the training pipeline and inference service
//!
//! Bootstrap configuration comes from an optional TOML file. Every key has
//! a built-in default, so a missing file is not an error:
//!
//! 1. Command-line arguments (applied by each binary on top of this)
//! 2. Explicit `--config` file (must exist and parse)
//! 3. `hbc.toml` in the working directory, if present
//! 4. Built-in defaults

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{Error, Result};

/// File name looked up when no explicit config path is given
pub const DEFAULT_CONFIG_FILE: &str = "hbc.toml";

/// Default upload limit for `/predict` (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Model artifact written by training and read by the service
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    #[serde(default)]
    pub training: TrainingConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Dataset locations for the training pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Directory that manifest `fname` entries are relative to
    #[serde(default = "default_dataset_dir")]
    pub dataset_dir: PathBuf,

    /// Manifest CSV files, relative to `dataset_dir` unless absolute
    #[serde(default = "default_manifests")]
    pub manifests: Vec<PathBuf>,
}

/// Inference service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Maximum accepted request body size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` overrides
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("heartbeat_rf_model.json")
}

fn default_dataset_dir() -> PathBuf {
    PathBuf::from("datasets/dataset")
}

fn default_manifests() -> Vec<PathBuf> {
    vec![PathBuf::from("set_a.csv"), PathBuf::from("set_b.csv")]
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            training: TrainingConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dataset_dir: default_dataset_dir(),
            manifests: default_manifests(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl TrainingConfig {
    /// Manifest paths resolved against `dataset_dir`
    pub fn manifest_paths(&self) -> Vec<PathBuf> {
        self.manifests
            .iter()
            .map(|m| self.dataset_dir.join(m))
            .collect()
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load configuration from a specific file
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read TOML failed ({}): {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Resolve configuration
    ///
    /// An explicit path must load successfully. Without one,
    /// `search_dir/hbc.toml` is used when it exists; otherwise defaults are
    /// returned. Runs before logging is initialised, so the caller reports
    /// the returned [`ConfigSource`].
    pub fn resolve(explicit: Option<&Path>, search_dir: &Path) -> Result<LoadedConfig> {
        if let Some(path) = explicit {
            return Ok(LoadedConfig {
                config: Self::load_file(path)?,
                source: ConfigSource::File(path.to_path_buf()),
            });
        }

        let candidate = search_dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            return Ok(LoadedConfig {
                config: Self::load_file(&candidate)?,
                source: ConfigSource::File(candidate),
            });
        }

        Ok(LoadedConfig {
            config: Self::default(),
            source: ConfigSource::Defaults,
        })
    }
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Defaults => write!(f, "built-in defaults"),
        }
    }
}

/// Resolved configuration and its source
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    pub source: ConfigSource,
}

impl LoadedConfig {
    /// Log the configuration source (call once tracing is initialised)
    pub fn log_source(&self) {
        match &self.source {
            ConfigSource::File(path) => info!("Configuration loaded from {}", path.display()),
            ConfigSource::Defaults => warn!(
                "No {} found, using built-in defaults",
                DEFAULT_CONFIG_FILE
            ),
        }
    }
}
