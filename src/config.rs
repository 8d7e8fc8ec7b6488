//! Configuration for the statepath binary.
//!
//! Values are layered: defaults, then an optional YAML file
//! (`STATEPATH_CONFIG` or `--config`), then `STATEPATH_*` environment
//! variables, then command-line flags.

use serde::{Deserialize, Serialize};
use statepath_paths::{EnumeratorConfig, EnumeratorError, HashAlgorithm};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path enumeration limits and hashing.
    pub enumeration: EnumeratorConfig,
    /// Manifest and dry-run settings.
    pub sync: SyncConfig,
    /// Log filter.
    pub logging: LoggingConfig,
}

impl Config {
    /// Loads configuration from an explicit file (if any) and the environment.
    pub fn load_from(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `STATEPATH_*` overrides from `lookup`.
    ///
    /// Unparseable values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(n) = lookup("STATEPATH_MAX_VISITS").and_then(|v| v.parse().ok()) {
            self.enumeration.max_visits_per_state = n;
        }
        if let Some(value) = lookup("STATEPATH_MAX_DEPTH") {
            match value.trim() {
                "" | "none" => self.enumeration.max_path_depth = None,
                s => {
                    if let Ok(n) = s.parse() {
                        self.enumeration.max_path_depth = Some(n);
                    }
                }
            }
        }
        if let Some(algorithm) = lookup("STATEPATH_HASH").and_then(|v| v.parse::<HashAlgorithm>().ok()) {
            self.enumeration.hash_algorithm = algorithm;
        }
        self.sync.apply_overrides(&lookup);
        self.logging.apply_overrides(&lookup);
    }

    /// Checks the enumeration limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Ok(self.enumeration.validate()?)
    }

    /// Writes configuration as YAML, e.g. for `statepath init`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Sync configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Manifest of previously generated tests.
    pub manifest_path: PathBuf,
    /// Classify and plan without writing the manifest.
    pub dry_run: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            manifest_path: PathBuf::from("statepath-manifest.json"),
            dry_run: false,
        }
    }
}

impl SyncConfig {
    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("STATEPATH_MANIFEST") {
            self.manifest_path = PathBuf::from(path);
        }
        if let Some(value) = lookup("STATEPATH_DRY_RUN") {
            self.dry_run = matches!(value.to_lowercase().as_str(), "1" | "true" | "yes");
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl LoggingConfig {
    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup("STATEPATH_LOG") {
            self.level = level;
        }
    }
}

/// Errors loading, validating or writing a statepath config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read statepath config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write statepath config {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid YAML in statepath config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("cannot encode statepath config as YAML: {0}")]
    Serialize(serde_yaml::Error),

    #[error("invalid enumeration settings: {0}")]
    Enumeration(#[from] EnumeratorError),
}
