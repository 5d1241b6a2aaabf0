//! Operator configuration.
//!
//! # Responsibility
//! - Load reconciliation settings from a TOML file.
//! - Provide defaults for every setting so an empty file is valid.
//!
//! # Invariants
//! - `store_key` is never blank after loading.
//! - Unknown keys are rejected instead of ignored.

use crate::logging::default_log_level;
use crate::reconcile::id_gen::IdSeed;
use crate::service::reconcile_service::DEFAULT_STORE_KEY;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_DB_FILE_NAME: &str = "folio.sqlite3";

/// Configuration loading errors.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    BlankStoreKey,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::BlankStoreKey => write!(f, "store_key cannot be blank"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::BlankStoreKey => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Settings for a reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FolioConfig {
    /// Store key holding the serialized collection.
    pub store_key: String,
    /// SQLite database file backing the store.
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling logs; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    /// Fixed seed for replacement ids, for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            store_key: DEFAULT_STORE_KEY.to_string(),
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            seed: None,
        }
    }
}

impl FolioConfig {
    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(text)?;
        config.store_key = config.store_key.trim().to_string();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_key.trim().is_empty() {
            return Err(ConfigError::BlankStoreKey);
        }
        Ok(())
    }

    pub fn id_seed(&self) -> Option<IdSeed> {
        self.seed.map(IdSeed::fixed)
    }
}
