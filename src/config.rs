use crate::error::{LvrError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "lvr.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub ingest: IngestConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database: PathBuf,
    pub table: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("lvr.db"),
            table: "lvr_lnd".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub data_root: PathBuf,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("opendata"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "lvr_trend=info".to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
        }
    }
}

impl Config {
    /// Load `path`, or `lvr.toml` when none is given. A missing default file
    /// means defaults; a missing explicitly named file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config_path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        if !config_path.exists() {
            if explicit {
                return Err(LvrError::Config(format!(
                    "config file '{}' not found",
                    config_path.display()
                )));
            }
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&config_path).map_err(|e| {
            LvrError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.storage.table.trim().is_empty() {
            return Err(LvrError::Config("storage.table must not be empty".into()));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let c = Config::from_toml("").unwrap();
        assert_eq!(c, Config::default());
        assert_eq!(c.storage.table, "lvr_lnd");
        assert_eq!(c.logging.filter, "lvr_trend=info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let c = Config::from_toml(
            r#"
            [storage]
            database = "data/prices.db"

            [logging]
            log_dir = "logs"
            "#,
        )
        .unwrap();
        assert_eq!(c.storage.database, PathBuf::from("data/prices.db"));
        assert_eq!(c.storage.table, "lvr_lnd");
        assert_eq!(c.logging.log_dir, Some(PathBuf::from("logs")));
        assert_eq!(c.ingest.data_root, PathBuf::from("opendata"));
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(matches!(Config::from_toml("[storage"), Err(LvrError::Toml(_))));
        assert!(matches!(
            Config::from_toml("[storage]\ntable = \" \""),
            Err(LvrError::Config(_))
        ));
    }

    #[test]
    fn named_file_must_exist() {
        let missing = Path::new("/definitely/not/here/lvr.toml");
        assert!(matches!(Config::load(Some(missing)), Err(LvrError::Config(_))));
    }
}
