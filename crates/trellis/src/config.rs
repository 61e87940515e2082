//! Service configuration.
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. A TOML file or string
//! 3. Environment variables
//!
//! Environment variables take precedence over file values.
//!
//! ```toml
//! [binary]
//! base_path = "/var/lib/trellis/binaries"
//! hierarchy = 3
//! length = 2
//!
//! [store]
//! database = "/var/lib/trellis/resources.db"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use trellis_binary::{FileBinaryConfig, FileBinaryService};
use trellis_store::{SqliteImmutableStore, SqliteMutableStore};

use crate::error::{Result, TrellisError};

pub const ENV_BINARY_BASE_PATH: &str = "TRELLIS_FILE_BINARY_BASEPATH";
pub const ENV_BINARY_HIERARCHY: &str = "TRELLIS_FILE_BINARY_HIERARCHY";
pub const ENV_BINARY_LENGTH: &str = "TRELLIS_FILE_BINARY_LENGTH";
pub const ENV_STORE_DATABASE: &str = "TRELLIS_STORE_DATABASE";

/// Resource store settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file. In-memory when unset.
    pub database: Option<PathBuf>,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrellisConfig {
    pub binary: FileBinaryConfig,
    pub store: StoreConfig,
}

impl TrellisConfig {
    /// Parse TOML and apply process environment overrides.
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config = Self::parse(toml_content)?;
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Read a TOML file and apply process environment overrides.
    ///
    /// A missing file yields the defaults.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                return Err(TrellisError::Config(format!(
                    "failed to read config file {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Parse TOML without consulting the environment.
    pub fn parse(toml_content: &str) -> Result<Self> {
        toml::from_str(toml_content)
            .map_err(|e| TrellisError::Config(format!("failed to parse config: {}", e)))
    }

    /// Override values from an environment lookup.
    ///
    /// Empty variables are ignored. Numeric variables that do not parse are
    /// a configuration error.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(val) = var(ENV_BINARY_BASE_PATH) {
            self.binary.base_path = Some(PathBuf::from(val));
        }

        if let Some(val) = var(ENV_BINARY_HIERARCHY) {
            self.binary.hierarchy = parse_usize(ENV_BINARY_HIERARCHY, &val)?;
        }

        if let Some(val) = var(ENV_BINARY_LENGTH) {
            self.binary.length = parse_usize(ENV_BINARY_LENGTH, &val)?;
        }

        if let Some(val) = var(ENV_STORE_DATABASE) {
            self.store.database = Some(PathBuf::from(val));
        }

        Ok(())
    }

    /// Build the file binary store described by `[binary]`.
    pub fn file_binary_service(&self) -> Result<FileBinaryService> {
        Ok(FileBinaryService::from_config(&self.binary)?)
    }

    /// Open the mutable and immutable SQLite stores described by `[store]`.
    ///
    /// Both share one connection.
    pub fn open_stores(&self) -> Result<(SqliteMutableStore, SqliteImmutableStore)> {
        let mutable = match &self.store.database {
            Some(path) => SqliteMutableStore::open(path)?,
            None => SqliteMutableStore::open_memory()?,
        };
        let immutable = mutable.immutable_store();
        Ok((mutable, immutable))
    }
}

fn parse_usize(name: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| {
            TrellisError::Config(format!(
                "{} must be a non-negative integer, got {:?}",
                name, value
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = TrellisConfig::parse("").unwrap();
        assert_eq!(config, TrellisConfig::default());
        assert_eq!(config.binary.hierarchy, 3);
        assert_eq!(config.binary.length, 2);
        assert!(config.binary.base_path.is_none());
        assert!(config.store.database.is_none());
    }

    #[test]
    fn test_parse_sections() {
        let config = TrellisConfig::parse(
            r#"
            [binary]
            base_path = "/data/binaries"
            hierarchy = 2
            length = 4

            [store]
            database = "/data/resources.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.binary.base_path, Some(PathBuf::from("/data/binaries")));
        assert_eq!(config.binary.hierarchy, 2);
        assert_eq!(config.binary.length, 4);
        assert_eq!(config.store.database, Some(PathBuf::from("/data/resources.db")));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = TrellisConfig::parse(
            r#"
            [binary]
            base_path = "/from/file"
            "#,
        )
        .unwrap();

        config
            .apply_env_overrides(env(&[
                (ENV_BINARY_BASE_PATH, "/from/env"),
                (ENV_BINARY_HIERARCHY, "4"),
                (ENV_BINARY_LENGTH, ""),
            ]))
            .unwrap();

        assert_eq!(config.binary.base_path, Some(PathBuf::from("/from/env")));
        assert_eq!(config.binary.hierarchy, 4);
        assert_eq!(config.binary.length, 2);
    }

    #[test]
    fn test_bad_numeric_env() {
        let mut config = TrellisConfig::default();
        let err = config
            .apply_env_overrides(env(&[(ENV_BINARY_LENGTH, "two")]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_missing_base_path_is_configuration_error() {
        let config = TrellisConfig::default();
        let err = config.file_binary_service().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_file_config_builds_services() {
        let dir = tempfile::tempdir().unwrap();
        let binaries = dir.path().join("binaries");
        let path = dir.path().join("trellis.toml");
        std::fs::write(
            &path,
            format!(
                "[binary]\nbase_path = {:?}\n\n[store]\ndatabase = {:?}\n",
                binaries.display().to_string(),
                dir.path().join("resources.db").display().to_string()
            ),
        )
        .unwrap();

        let mut config = TrellisConfig::parse(&std::fs::read_to_string(&path).unwrap()).unwrap();
        config.apply_env_overrides(env(&[])).unwrap();

        let service = config.file_binary_service().unwrap();
        assert_eq!(service.base_path(), binaries.as_path());
        assert!(config.open_stores().is_ok());
    }
}
