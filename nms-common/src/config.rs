//! Bootstrap configuration loading
//!
//! Configuration is bootstrap-only: it is read once at startup and cannot
//! change while the gateway is running.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (applied by the binary on top of [`TomlConfig`])
//! 2. Environment variables (`NMS_CONFIG`, plus the binary's `env` fallbacks)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! A missing configuration file is not fatal: the gateway logs a warning and
//! starts with compiled defaults. A file that exists but does not parse is an
//! error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "NMS_CONFIG";

/// Default MOS TCP port (MOS upper port convention)
pub const DEFAULT_MOS_PORT: u16 = 10540;

/// Default HTTP port for health and the notification stream
pub const DEFAULT_HTTP_PORT: u16 = 10541;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Path to SQLite database file (defaults to the platform data directory)
    pub database_path: Option<PathBuf>,

    /// Tenant (client) identifier applied to every record this gateway writes
    pub client_id: i64,

    /// MOS listener settings
    pub mos: MosConfig,

    /// HTTP side channel settings
    pub http: HttpConfig,

    /// Notification bus settings
    pub events: EventsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            client_id: 1,
            mos: MosConfig::default(),
            http: HttpConfig::default(),
            events: EventsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// MOS TCP listener configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MosConfig {
    /// Interface to bind
    pub host: String,
    /// TCP port to bind
    pub port: u16,
    /// Upper bound for one handler invocation (including rundown lock wait)
    pub handler_timeout_ms: u64,
    /// Largest accepted inbound document
    pub max_message_bytes: usize,
}

impl Default for MosConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_MOS_PORT,
            handler_timeout_ms: 5000,
            max_message_bytes: 1024 * 1024,
        }
    }
}

impl MosConfig {
    pub fn handler_timeout(&self) -> Duration {
        Duration::from_millis(self.handler_timeout_ms)
    }
}

/// HTTP side channel configuration (health + SSE notifications)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: DEFAULT_HTTP_PORT,
        }
    }
}

/// Notification bus configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Number of notifications buffered per subscriber before lagging
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { capacity: 1000 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Resolved database path (configured value or platform default)
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }

    /// Reject values the gateway cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.mos.handler_timeout_ms == 0 {
            return Err(Error::Config(
                "mos.handler_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.mos.max_message_bytes == 0 {
            return Err(Error::Config(
                "mos.max_message_bytes must be greater than zero".to_string(),
            ));
        }
        if self.events.capacity == 0 {
            return Err(Error::Config(
                "events.capacity must be greater than zero".to_string(),
            ));
        }
        if self.client_id <= 0 {
            return Err(Error::Config(format!(
                "client_id must be positive, got {}",
                self.client_id
            )));
        }
        Ok(())
    }
}

/// Parse a TOML configuration file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

/// Load configuration following the priority order
///
/// An explicit path (command line) that does not exist is an error; a missing
/// file found through the environment or platform locations falls back to
/// defaults with a warning.
pub fn load_config(cli_path: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = cli_path {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        info!("Loading configuration from {}", path.display());
        return load_toml_config(path);
    }

    match locate_config_file() {
        Some(path) if path.exists() => {
            info!("Loading configuration from {}", path.display());
            load_toml_config(&path)
        }
        Some(path) => {
            warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            Ok(TomlConfig::default())
        }
        None => {
            warn!("No config file found, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Find the configuration file: `NMS_CONFIG`, then user, then system location
pub fn locate_config_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    let user_config = dirs::config_dir().map(|d| d.join("nms").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/nms/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("nms"))
        .unwrap_or_else(|| PathBuf::from("./nms_data"))
        .join("nms.db")
}
