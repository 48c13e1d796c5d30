//! YAML configuration
//!
//! ```yaml
//! namespaces:
//!   literal: http://kgsync.local/literal/
//!   source: http://kgsync.local/source/
//! log:
//!   filter: kgsync=debug
//! ```
//!
//! Every field is optional; a missing file yields the defaults.

use crate::export::Namespaces;
use crate::reconcile::Reconciler;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub namespaces: Namespaces,
    pub log: LogConfig,
}

impl Config {
    /// Default location (~/.config/kgsync/config.yaml)
    pub fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".config"));
        config_dir.join("kgsync").join("config.yaml")
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::from_yaml(&raw).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Reconciler minting literal ids under the configured namespace
    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new().with_literal_namespace(self.namespaces.literal.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.log.filter, "info");
        assert_eq!(config.namespaces.literal, "http://kgsync.local/literal/");
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "namespaces:\n  literal: http://example.org/lit/\nlog:\n  filter: debug").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.namespaces.literal, "http://example.org/lit/");
        assert_eq!(config.namespaces.source, "http://kgsync.local/source/");
        assert_eq!(config.log.filter, "debug");
        assert_eq!(config.reconciler().literal_namespace(), "http://example.org/lit/");
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = NamedTempFile::new().unwrap();
        assert_eq!(Config::load(file.path()).unwrap(), Config::default());
    }

    #[test]
    fn malformed_yaml_is_reported_with_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "namespaces: [not, a, map]").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn default_path_ends_in_kgsync_dir() {
        let path = Config::default_path();
        assert!(path.ends_with("kgsync/config.yaml"));
    }
}
