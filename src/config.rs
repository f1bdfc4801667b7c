//! # Registry Configuration
//!
//! Environment-aware configuration loading for registry instances. Follows
//! the same approach as the rest of the deployment tooling: explicit YAML
//! files with environment overlays, no hidden fallbacks beyond documented
//! defaults.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use registry_core::config::RegistryConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration (environment auto-detected, file optional)
//! let config = RegistryConfig::load()?;
//! println!("event channel capacity: {}", config.events.channel_capacity);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use serde_yaml::Value as YamlValue;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigurationError>;

/// Root configuration for a registry instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Collection name, used in event topics and log fields.
    pub collection: String,

    /// Event bus settings.
    pub events: EventConfig,

    /// Readiness signalling settings.
    pub readiness: ReadinessConfig,
}

/// Event bus settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Capacity of the broadcast channel behind the event publisher.
    pub channel_capacity: usize,
}

/// Readiness signalling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Topic reported to the readiness tracker on start and shutdown.
    pub topic: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            collection: "entities".to_string(),
            events: EventConfig::default(),
            readiness: ReadinessConfig::default(),
        }
    }
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1000,
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            topic: "registry.serving".to_string(),
        }
    }
}

impl RegistryConfig {
    /// Load configuration with environment auto-detection.
    ///
    /// If `REGISTRY_CONFIG` names a YAML file, it is loaded and merged with
    /// its environment overlay (`<stem>.<environment>.yaml` next to it, when
    /// present). Without the variable, documented defaults are used.
    pub fn load() -> ConfigResult<Self> {
        match env::var("REGISTRY_CONFIG") {
            Ok(path) => Self::load_from_file(Path::new(&path)),
            Err(_) => {
                debug!("REGISTRY_CONFIG not set, using default registry configuration");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a YAML file, merging the environment overlay
    /// file (`<stem>.<environment>.yaml`) over it when one exists.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let environment = Self::detect_environment();
        let base = Self::read_yaml(path)?;

        let merged = match Self::overlay_path(path, &environment) {
            Some(overlay_path) if overlay_path.exists() => {
                debug!(
                    environment = %environment,
                    overlay = %overlay_path.display(),
                    "merging environment overlay over base configuration"
                );
                let overlay = Self::read_yaml(&overlay_path)?;
                merge_yaml(base, overlay)
            }
            _ => base,
        };

        serde_yaml::from_value(merged).map_err(|source| ConfigurationError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        serde_yaml::from_str(yaml).map_err(|source| ConfigurationError::Parse {
            path: "<inline>".to_string(),
            source,
        })
    }

    /// Detect the current environment from environment variables.
    pub fn detect_environment() -> String {
        env::var("REGISTRY_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    fn read_yaml(path: &Path) -> ConfigResult<YamlValue> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigurationError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    fn overlay_path(path: &Path, environment: &str) -> Option<PathBuf> {
        let stem = path.file_stem()?.to_str()?;
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        Some(parent.join(format!("{stem}.{environment}.yaml")))
    }
}

/// Deep-merge two YAML values: overlay mappings win key-by-key, everything
/// else is replaced wholesale.
fn merge_yaml(base: YamlValue, overlay: YamlValue) -> YamlValue {
    match (base, overlay) {
        (YamlValue::Mapping(mut base_map), YamlValue::Mapping(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => merge_yaml(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            YamlValue::Mapping(base_map)
        }
        (_, overlay) => overlay,
    }
}
