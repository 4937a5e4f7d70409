//! # Configuration for the datastore
//!
//! This crate provides the configuration provider used by the store factory:
//! a string-keyed lookup over a TOML document, and the [`ConnectionOptions`]
//! snapshot read from it.
//!
//! ## Quick Start
//!
//! ### Programmatic Configuration
//! ```rust
//! use config::ConnectionOptions;
//! use std::time::Duration;
//!
//! let options = ConnectionOptions::new("localhost", "app")
//!     .with_credentials("app", "secret")
//!     .with_pool_limits(2, 20)
//!     .with_max_connection_life_time(Duration::from_secs(3600));
//! assert!(options.validate().is_ok());
//! ```
//!
//! ### TOML File Configuration
//! ```toml
//! [db]
//! host = "127.0.0.1:5432"
//! username = "app"
//! password = "secret"
//! database = "app"
//! max-idle-connections = 2
//! max-open-connections = 20
//! max-connection-life-time = "1h"
//! log-level = 4
//! ```
//!
//! Load configuration:
//! ```rust,no_run
//! use config::{ConnectionOptions, Settings};
//!
//! // Load from datastore.toml (or the path in DATASTORE_CONFIG)
//! let settings = Settings::load()?;
//! let options = ConnectionOptions::from_settings(&settings)?;
//! # Ok::<(), config::ConfigError>(())
//! ```

use serde::Deserialize;
use std::{env, fmt, path::Path, time::Duration};
use thiserror::Error;

const DEFAULT_CONFIG_FILE: &str = "datastore.toml";
const CONFIG_PATH_ENV: &str = "DATASTORE_CONFIG";

const DEFAULT_PORT: u16 = 5432;
const DEFAULT_MAX_OPEN_CONNECTIONS: u32 = 10;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Keys read by [`ConnectionOptions::from_settings`].
pub mod keys {
    pub const HOST: &str = "db.host";
    pub const PORT: &str = "db.port";
    pub const USERNAME: &str = "db.username";
    pub const PASSWORD: &str = "db.password";
    pub const DATABASE: &str = "db.database";
    pub const MAX_IDLE_CONNECTIONS: &str = "db.max-idle-connections";
    pub const MAX_OPEN_CONNECTIONS: &str = "db.max-open-connections";
    pub const MAX_CONNECTION_LIFE_TIME: &str = "db.max-connection-life-time";
    pub const CONNECT_TIMEOUT: &str = "db.connect-timeout";
    pub const LOG_LEVEL: &str = "db.log-level";
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Missing required configuration key: {0}")]
    Missing(String),
    #[error("Invalid configuration for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// The `[db]` table as written in the config file
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DbSection {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    database: Option<String>,
    max_idle_connections: Option<u32>,
    max_open_connections: Option<u32>,
    max_connection_life_time: Option<DurationValue>,
    connect_timeout: Option<DurationValue>,
    log_level: Option<LogLevel>,
}

#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    db: DbSection,
}

/// Integer seconds, or a humantime string such as `"1h30m"`
#[derive(Clone, Deserialize)]
#[serde(untagged)]
enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    fn resolve(&self, key: &str) -> Result<Duration, ConfigError> {
        match self {
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => parse_duration(text)
                .map_err(|reason| ConfigError::invalid(key, format!("'{}': {}", text, reason))),
        }
    }
}

/// Configuration loaded from a TOML document.
///
/// The `[db]` table is deserialized when the document is parsed, so type
/// errors surface on load. [`Settings::get`] still resolves any dotted key
/// (`db.max-open-connections` is `max-open-connections` inside `[db]`).
#[derive(Clone, Default)]
pub struct Settings {
    table: toml::Table,
    db: DbSection,
}

// Values can hold credentials, so only the key names are shown.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("keys", &self.table.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Settings {
    /// Load settings from the file named by `DATASTORE_CONFIG` (which may be
    /// set in a `.env` file), falling back to `./datastore.toml`
    pub fn load() -> Result<Self, ConfigError> {
        ignore_missing(dotenvy::dotenv())?;
        Self::resolve(Path::new("."))
    }

    /// Same lookup as [`Settings::load`], with `.env` and `datastore.toml`
    /// taken from `dir` instead of the working directory
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        ignore_missing(dotenvy::from_path(dir.join(".env")))?;
        Self::resolve(dir)
    }

    fn resolve(dir: &Path) -> Result<Self, ConfigError> {
        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            return Self::from_file(&config_path);
        }

        let default_path = dir.join(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Err(ConfigError::invalid(
                CONFIG_PATH_ENV,
                format!(
                    "config path must be set in the environment or a .env file, or {} must exist",
                    default_path.display()
                ),
            ))
        }
    }

    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse settings from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(content)?;
        let document: Document = toml::from_str(content)?;
        Ok(Self {
            table,
            db: document.db,
        })
    }

    /// Raw value lookup by dotted key
    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        let mut segments = key.split('.');
        let mut value = self.table.get(segments.next()?)?;
        for segment in segments {
            value = value.as_table()?.get(segment)?;
        }
        Some(value)
    }
}

fn ignore_missing<T>(result: Result<T, dotenvy::Error>) -> Result<(), ConfigError> {
    match result {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Parse a duration such as `"250ms"`, `"10s"`, `"1h30m"` or `"2h 5m"`
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("duration string is empty".to_string());
    }
    humantime::parse_duration(input).map_err(|e| e.to_string())
}

/// Driver statement logging verbosity, numbered as in `db.log-level`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "i64")]
pub enum LogLevel {
    #[default]
    Silent,
    Error,
    Warn,
    Info,
}

impl TryFrom<i64> for LogLevel {
    type Error = ConfigError;

    fn try_from(level: i64) -> Result<Self, ConfigError> {
        match level {
            0 | 1 => Ok(LogLevel::Silent),
            2 => Ok(LogLevel::Error),
            3 => Ok(LogLevel::Warn),
            4 => Ok(LogLevel::Info),
            other => Err(ConfigError::invalid(
                keys::LOG_LEVEL,
                format!("unknown log level {} (expected 0-4)", other),
            )),
        }
    }
}

/// Connection pool settings, read once from configuration
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    /// Connections kept open while idle
    pub max_idle_connections: u32,
    pub max_open_connections: u32,
    /// Zero means connections are never recycled by age
    pub max_connection_life_time: Duration,
    pub connect_timeout: Duration,
    pub log_level: LogLevel,
}

impl ConnectionOptions {
    /// Create options for a host and database with default pool limits
    pub fn new(host: impl Into<String>, database: impl Into<String>) -> Self {
        let (host, port) = split_host_port(&host.into());
        Self {
            host,
            port: port.unwrap_or(DEFAULT_PORT),
            username: String::new(),
            password: String::new(),
            database: database.into(),
            max_idle_connections: 0,
            max_open_connections: DEFAULT_MAX_OPEN_CONNECTIONS,
            max_connection_life_time: Duration::ZERO,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            log_level: LogLevel::Silent,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn with_pool_limits(mut self, max_idle: u32, max_open: u32) -> Self {
        self.max_idle_connections = max_idle;
        self.max_open_connections = max_open;
        self
    }

    pub fn with_max_connection_life_time(mut self, life_time: Duration) -> Self {
        self.max_connection_life_time = life_time;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Read the `db.*` keys from settings and validate the result
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let db = settings.db.clone();
        let host = db
            .host
            .ok_or_else(|| ConfigError::Missing(keys::HOST.to_string()))?;
        let database = db
            .database
            .ok_or_else(|| ConfigError::Missing(keys::DATABASE.to_string()))?;

        let mut options = Self::new(host, database);

        if let Some(port) = db.port {
            options.port = port;
        }
        if let Some(username) = db.username {
            options.username = username;
        }
        if let Some(password) = db.password {
            options.password = password;
        }
        if let Some(max_idle) = db.max_idle_connections {
            options.max_idle_connections = max_idle;
        }
        if let Some(max_open) = db.max_open_connections {
            options.max_open_connections = max_open;
        }
        if let Some(life_time) = db.max_connection_life_time {
            options.max_connection_life_time = life_time.resolve(keys::MAX_CONNECTION_LIFE_TIME)?;
        }
        if let Some(timeout) = db.connect_timeout {
            options.connect_timeout = timeout.resolve(keys::CONNECT_TIMEOUT)?;
        }
        if let Some(level) = db.log_level {
            options.log_level = level;
        }

        options.validate()?;
        Ok(options)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::invalid(keys::HOST, "host cannot be empty"));
        }
        if self.port == 0 {
            return Err(ConfigError::invalid(keys::PORT, "port cannot be zero"));
        }
        if self.database.is_empty() {
            return Err(ConfigError::invalid(
                keys::DATABASE,
                "database name cannot be empty",
            ));
        }
        if self.max_open_connections == 0 {
            return Err(ConfigError::invalid(
                keys::MAX_OPEN_CONNECTIONS,
                "must be greater than 0",
            ));
        }
        if self.max_idle_connections > self.max_open_connections {
            return Err(ConfigError::invalid(
                keys::MAX_IDLE_CONNECTIONS,
                "cannot be greater than max-open-connections",
            ));
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::invalid(
                keys::CONNECT_TIMEOUT,
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

// Password stays out of logs and error messages.
impl fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("max_idle_connections", &self.max_idle_connections)
            .field("max_open_connections", &self.max_open_connections)
            .field("max_connection_life_time", &self.max_connection_life_time)
            .field("connect_timeout", &self.connect_timeout)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl fmt::Display for ConnectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "{}@[{}]:{}", self.username, self.host, self.port)?;
        } else {
            write!(f, "{}@{}:{}", self.username, self.host, self.port)?;
        }
        write!(
            f,
            "/{} (max_idle={}, max_open={}, max_life_time={:?})",
            self.database,
            self.max_idle_connections,
            self.max_open_connections,
            self.max_connection_life_time
        )
    }
}

/// Split `host:port` or `[v6addr]:port`. A bare IPv6 address has no port.
fn split_host_port(host: &str) -> (String, Option<u16>) {
    if let Some(rest) = host.strip_prefix('[') {
        return match rest.split_once(']') {
            Some((addr, tail)) => (
                addr.to_string(),
                tail.strip_prefix(':').and_then(|port| port.parse().ok()),
            ),
            None => (host.to_string(), None),
        };
    }

    match host.rsplit_once(':') {
        Some((name, port)) if !name.is_empty() && !name.contains(':') => match port.parse() {
            Ok(port) => (name.to_string(), Some(port)),
            Err(_) => (host.to_string(), None),
        },
        _ => (host.to_string(), None),
    }
}
