//! For reading application configuration.

use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Item endpoint behaviour.
    pub items: ItemsConfig,
    /// Cross-origin policy.
    pub cors: CorsConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server address.
    pub address: String,
    /// Server http port.
    pub http_port: u16,
    /// How long a request may take before it is aborted.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Maximum number of requests in flight.
    pub concurrency_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            http_port: 8080,
            request_timeout: Duration::from_secs(10),
            concurrency_limit: 500,
        }
    }
}

/// Database configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// The database connection string.
    pub url: String,
    /// The maximum size of the connection pool.
    pub max_connections: u32,
    /// How long to wait for a pooled connection.
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://items.db?mode=rwc".to_string(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// How `PUT /items/:id` treats its body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Both fields are replaced, `title` is required.
    Full,
    /// Only the fields present in the body are replaced.
    #[default]
    Partial,
}

/// How the id of a freshly inserted row is recovered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertIdStrategy {
    /// `INSERT ... RETURNING id`.
    Returning,
    /// `SELECT last_insert_rowid()` on the connection that did the insert.
    #[default]
    LastInsertRowid,
}

/// Item endpoint configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ItemsConfig {
    /// Full replacement or partial update.
    pub update_mode: UpdateMode,
    /// Insert id recovery.
    pub insert_id: InsertIdStrategy,
}

/// Cross-origin resource sharing configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Whether the CORS layer is installed at all.
    pub enabled: bool,
    /// Allowed origins, `"*"` allows any.
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directives, used when `RUST_LOG` is not set.
    pub filter: String,
    /// Write hourly rolling JSON logs to this directory.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,tower_http=debug,items_api=debug".to_string(),
            directory: None,
        }
    }
}

/// Retrieve [`Config`] from the optional `config` file and `APP__*` environment variables.
#[tracing::instrument]
pub fn load_config() -> Result<Config, config::ConfigError> {
    config::Config::builder()
        .add_source(config::File::with_name("config").required(false))
        .add_source(
            config::Environment::with_prefix("app")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("cors.allowed_origins"),
        )
        .build()?
        .try_deserialize()
}
