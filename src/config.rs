use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Which key-value engine backs the snapshot store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Redb,
    Memory,
}

impl StorageKind {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "redb" => Some(Self::Redb),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Logical namespaces inside the key-value engine
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Namespaces {
    pub host_snapshots: String,
}

impl Default for Namespaces {
    fn default() -> Self {
        Self {
            host_snapshots: "host_snapshots".to_string(),
        }
    }
}

/// Application configuration.
///
/// Built from defaults, then the TOML file named by `HOSTWATCH_CONFIG` if
/// set, then individual `HOSTWATCH_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub storage: StorageKind,
    pub log_level: String,
    pub namespaces: Namespaces,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            data_dir: PathBuf::from("./data"),
            storage: StorageKind::Redb,
            log_level: "info".to_string(),
            namespaces: Namespaces::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match env::var("HOSTWATCH_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|name| env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Unparseable values are ignored and the current setting kept
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("HOSTWATCH_PORT").and_then(|s| s.parse().ok()) {
            self.port = port;
        }
        if let Some(dir) = lookup("HOSTWATCH_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(storage) = lookup("HOSTWATCH_STORAGE").and_then(|s| StorageKind::parse(&s)) {
            self.storage = storage;
        }
        if let Some(level) = lookup("HOSTWATCH_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(ns) = lookup("HOSTWATCH_SNAPSHOT_NAMESPACE") {
            self.namespaces.host_snapshots = ns;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_toml_partial_file_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            port = 8080
            storage = "memory"

            [namespaces]
            host_snapshots = "snapshots_v2"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.namespaces.host_snapshots, "snapshots_v2");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn test_env_overrides_and_bad_values() {
        let vars: HashMap<&str, &str> = [
            ("HOSTWATCH_PORT", "not-a-port"),
            ("HOSTWATCH_STORAGE", "MEMORY"),
            ("HOSTWATCH_LOG_LEVEL", "debug"),
            ("HOSTWATCH_DATA_DIR", "/var/lib/hostwatch"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.port, 3000);
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/hostwatch"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(matches!(
            Config::from_toml_str("port = \"eighty\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
