//! Storage configuration.
//!
//! # Responsibility
//! - Decide which storage adapter backs the repositories.
//! - Resolve the data location from the process environment.
//!
//! # Invariants
//! - A blank or missing data path means an in-memory store.
//! - Unknown backend names are rejected, never silently defaulted.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

pub const BACKEND_ENV: &str = "UNIVERSITY_STORAGE_BACKEND";
pub const DATA_PATH_ENV: &str = "UNIVERSITY_DATA_PATH";
pub const LOG_DIR_ENV: &str = "UNIVERSITY_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "UNIVERSITY_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnsupportedBackend(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedBackend(value) => write!(
                f,
                "unsupported storage backend `{value}`; expected relational|document"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Storage adapter selected at configuration time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageBackend {
    /// SQLite tables with foreign keys.
    #[default]
    Relational,
    /// JSON documents with embedded values and `$ref` links.
    Document,
}

impl StorageBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Relational => "relational",
            Self::Document => "document",
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "relational" | "sql" | "sqlite" => Ok(Self::Relational),
            "document" | "mongo" | "json" => Ok(Self::Document),
            other => Err(ConfigError::UnsupportedBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Backing file. `None` keeps everything in memory.
    pub data_path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn in_memory(backend: StorageBackend) -> Self {
        Self {
            backend,
            data_path: None,
        }
    }

    pub fn at_path(backend: StorageBackend, path: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            data_path: Some(path.into()),
        }
    }

    /// Reads [`BACKEND_ENV`] and [`DATA_PATH_ENV`] from the process
    /// environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let backend = match non_blank(lookup(BACKEND_ENV)) {
            Some(raw) => raw.parse()?,
            None => StorageBackend::default(),
        };
        let data_path = non_blank(lookup(DATA_PATH_ENV)).map(PathBuf::from);
        Ok(Self { backend, data_path })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}
