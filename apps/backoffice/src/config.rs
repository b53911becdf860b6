//! # Back Office Configuration
//!
//! Settings loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`SPARKS_*`)
//! 2. JSON file named by `SPARKS_CONFIG`
//! 3. Defaults (this file)
//!
//! ```json
//! {
//!   "databasePath": "/var/lib/sparks/sparks.db",
//!   "maxConnections": 5,
//!   "callTimeoutMs": 5000,
//!   "log": "info,sparks=debug"
//! }
//! ```
//!
//! Configuration is read-only after startup.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use sparks_db::DbConfig;

/// Names the optional JSON configuration file.
pub const CONFIG_FILE_VAR: &str = "SPARKS_CONFIG";

pub const DEFAULT_LOG_FILTER: &str = "info,sparks=debug,sqlx=warn";

const DB_FILE_NAME: &str = "sparks.db";

/// Back office configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// SQLite database file.
    /// Default: `<platform data dir>/sparks.db`
    pub database_path: PathBuf,

    /// Maximum number of pooled connections.
    /// Default: 5
    pub max_connections: u32,

    /// Upper bound for each storage call, in milliseconds. `None` waits
    /// indefinitely.
    pub call_timeout_ms: Option<u64>,

    /// `tracing` filter directive, used when `RUST_LOG` is unset.
    pub log: String,
}

/// Every key optional, so a file can override just a few settings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    max_connections: Option<u32>,
    call_timeout_ms: Option<u64>,
    log: Option<String>,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(|key| std::env::var(key).ok())
    }

    /// Loads configuration with `env` standing in for the environment.
    pub fn from_sources(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let file = match env(CONFIG_FILE_VAR) {
            Some(path) => read_file(Path::new(&path))?,
            None => ConfigFile::default(),
        };

        let database_path = match env("SPARKS_DB_PATH").map(PathBuf::from).or(file.database_path) {
            Some(path) => path,
            None => default_database_path()?,
        };

        let max_connections = match env("SPARKS_DB_MAX_CONNECTIONS") {
            Some(raw) => parse_var("SPARKS_DB_MAX_CONNECTIONS", &raw)?,
            None => file.max_connections.unwrap_or(5),
        };
        if max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "SPARKS_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        let call_timeout_ms = match env("SPARKS_CALL_TIMEOUT_MS") {
            Some(raw) => Some(parse_var("SPARKS_CALL_TIMEOUT_MS", &raw)?),
            None => file.call_timeout_ms,
        };

        let log = env("SPARKS_LOG")
            .or(file.log)
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(AppConfig {
            database_path,
            max_connections,
            call_timeout_ms,
            log,
        })
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }

    /// Storage settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        let config = DbConfig::new(&self.database_path).max_connections(self.max_connections);
        match self.call_timeout() {
            Some(timeout) => config.call_timeout(timeout),
            None => config,
        }
    }
}

/// Determines the database file path based on the platform.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/com.sparks.backoffice/sparks.db`
/// - **Windows**: `%APPDATA%\sparks\backoffice\data\sparks.db`
/// - **Linux**: `~/.local/share/backoffice/sparks.db`
pub fn default_database_path() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from("com", "sparks", "backoffice").ok_or(ConfigError::NoDataDir)?;
    Ok(dirs.data_dir().join(DB_FILE_NAME))
}

fn read_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Could not determine app data directory")]
    NoDataDir,

    #[error("Cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

// =============================================================================
// Unit Tests
// =============================================================================
