//! CLI configuration loading from file and environment variables.

use serde::Deserialize;
use thiserror::Error;
use workforce_db::{DatabaseSettings, EngineSettings};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection strings and pool tunables for both engines.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string for the blocking driver.
    #[serde(default = "default_url_sync")]
    pub url_sync: String,

    /// Connection string for the async driver.
    #[serde(default = "default_url_async")]
    pub url_async: String,

    /// Connections each pool keeps open at rest.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Extra connections each pool may open under load.
    #[serde(default = "default_max_overflow")]
    pub max_overflow: u32,

    /// SQLite busy timeout, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Log every executed statement at `info` level.
    #[serde(default)]
    pub echo: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "workforce_db=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_url_sync() -> String {
    "workforce.db".to_string()
}

fn default_url_async() -> String {
    "sqlite://workforce.db".to_string()
}

fn default_pool_size() -> u32 {
    EngineSettings::default().pool_size
}

fn default_max_overflow() -> u32 {
    EngineSettings::default().max_overflow
}

fn default_busy_timeout_ms() -> u64 {
    EngineSettings::default().busy_timeout_ms
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url_sync: default_url_sync(),
            url_async: default_url_async(),
            pool_size: default_pool_size(),
            max_overflow: default_max_overflow(),
            busy_timeout_ms: default_busy_timeout_ms(),
            echo: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration parsed but holds unusable values.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Validates the database section and converts it into engine settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a connection string is empty or the
    /// pool size is zero.
    pub fn database_settings(&self) -> Result<DatabaseSettings, ConfigError> {
        let db = &self.database;
        if db.url_sync.trim().is_empty() {
            return Err(ConfigError::Invalid("database.url_sync is empty".into()));
        }
        if db.url_async.trim().is_empty() {
            return Err(ConfigError::Invalid("database.url_async is empty".into()));
        }
        if db.pool_size == 0 {
            return Err(ConfigError::Invalid(
                "database.pool_size must be at least 1".into(),
            ));
        }

        Ok(DatabaseSettings {
            url_sync: db.url_sync.clone(),
            url_async: db.url_async.clone(),
            engine: EngineSettings {
                pool_size: db.pool_size,
                max_overflow: db.max_overflow,
                busy_timeout_ms: db.busy_timeout_ms,
                echo: db.echo,
            },
        })
    }
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `WORKFORCE_DATABASE_URL_SYNC` overrides `database.url_sync`
/// - `WORKFORCE_DATABASE_URL_ASYNC` overrides `database.url_async`
/// - `WORKFORCE_POOL_SIZE` overrides `database.pool_size`
/// - `WORKFORCE_MAX_OVERFLOW` overrides `database.max_overflow`
/// - `WORKFORCE_BUSY_TIMEOUT_MS` overrides `database.busy_timeout_ms`
/// - `WORKFORCE_DB_ECHO` overrides `database.echo` (set to "true" to enable)
/// - `WORKFORCE_LOG_LEVEL` overrides `logging.level`
/// - `WORKFORCE_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies `WORKFORCE_*` overrides looked up through `var`. Values that fail
/// to parse are ignored.
fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(url) = var("WORKFORCE_DATABASE_URL_SYNC") {
        config.database.url_sync = url;
    }
    if let Some(url) = var("WORKFORCE_DATABASE_URL_ASYNC") {
        config.database.url_async = url;
    }
    if let Some(parsed) = var("WORKFORCE_POOL_SIZE").and_then(|v| v.parse().ok()) {
        config.database.pool_size = parsed;
    }
    if let Some(parsed) = var("WORKFORCE_MAX_OVERFLOW").and_then(|v| v.parse().ok()) {
        config.database.max_overflow = parsed;
    }
    if let Some(parsed) = var("WORKFORCE_BUSY_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
        config.database.busy_timeout_ms = parsed;
    }
    if let Some(echo) = var("WORKFORCE_DB_ECHO") {
        config.database.echo = echo == "true" || echo == "1";
    }
    if let Some(level) = var("WORKFORCE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("WORKFORCE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}
