//! Service configuration and tracing bootstrap
//!
//! Settings resolve in this order:
//! 1. Command-line arguments
//! 2. Environment variables (`SISFO_*`, optionally from a `.env` file)
//! 3. TOML bootstrap file (`--config` / `SISFO_CONFIG`)
//! 4. Built-in defaults
//!
//! Clap folds 1 and 2 together through `env = ...`; the TOML file and the
//! defaults are layered underneath in [`ServiceConfig::resolve`].

use crate::deadline::DEFAULT_CALL_TIMEOUT_SECS;
use crate::{Error, Result};
use clap::Args;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://sisfo.db?mode=rwc";
pub const DEFAULT_STORAGE_PATH: &str = "./storage";
pub const DEFAULT_STORAGE_BASE_URL: &str = "http://localhost:9093/files";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Arguments shared by every service binary
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Optional TOML bootstrap file
    #[arg(long = "config", env = "SISFO_CONFIG")]
    pub config: Option<PathBuf>,

    /// HTTP port to listen on
    #[arg(short, long, env = "SISFO_HTTP_PORT")]
    pub port: Option<u16>,

    /// Database URL
    #[arg(long, env = "SISFO_DATABASE_URL")]
    pub database_url: Option<String>,

    /// NATS server URL; event ingress is disabled when unset
    #[arg(long, env = "SISFO_NATS_URL")]
    pub nats_url: Option<String>,

    /// Per-call engine timeout in seconds
    #[arg(long, env = "SISFO_CALL_TIMEOUT_SECS")]
    pub call_timeout_secs: Option<u64>,

    /// Directory for locally stored files
    #[arg(long, env = "SISFO_STORAGE_PATH")]
    pub storage_path: Option<PathBuf>,

    /// Public base URL of stored files
    #[arg(long, env = "SISFO_STORAGE_BASE_URL")]
    pub storage_base_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SISFO_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default)]
    pub nats_url: Option<String>,

    #[serde(default)]
    pub call_timeout_secs: Option<u64>,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[storage]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default)]
    pub base_url: Option<String>,
}

/// `[logging]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: Option<String>,
}

impl TomlConfig {
    /// Parse a TOML bootstrap file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))
    }
}

/// Fully resolved configuration of one service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub http_port: u16,
    pub database_url: String,
    pub nats_url: Option<String>,
    pub call_timeout: Duration,
    pub storage_path: PathBuf,
    pub storage_base_url: String,
    pub log_level: String,
}

impl ServiceConfig {
    /// Merge CLI/env arguments over the optional TOML file over defaults
    pub fn resolve(args: &CommonArgs, default_port: u16) -> Result<Self> {
        let file = match &args.config {
            Some(path) => TomlConfig::load(path)?,
            None => TomlConfig::default(),
        };
        Self::merge(args, file, default_port)
    }

    /// Merge without touching the filesystem
    pub fn merge(args: &CommonArgs, file: TomlConfig, default_port: u16) -> Result<Self> {
        let config = ServiceConfig {
            http_port: args.port.or(file.port).unwrap_or(default_port),
            database_url: args
                .database_url
                .clone()
                .or(file.database_url)
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            nats_url: args
                .nats_url
                .clone()
                .or(file.nats_url)
                .filter(|url| !url.trim().is_empty()),
            call_timeout: Duration::from_secs(
                args.call_timeout_secs
                    .or(file.call_timeout_secs)
                    .unwrap_or(DEFAULT_CALL_TIMEOUT_SECS),
            ),
            storage_path: args
                .storage_path
                .clone()
                .or(file.storage.path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH)),
            storage_base_url: args
                .storage_base_url
                .clone()
                .or(file.storage.base_url)
                .unwrap_or_else(|| DEFAULT_STORAGE_BASE_URL.to_string()),
            log_level: args
                .log_level
                .clone()
                .or(file.logging.level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.http_port == 0 {
            return Err(Error::Config("HTTP port must be non-zero".to_string()));
        }
        if self.call_timeout < Duration::from_secs(1) {
            return Err(Error::Config("Call timeout must be at least 1 second".to_string()));
        }
        if self.database_url.trim().is_empty() {
            return Err(Error::Config("Database URL must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Load `.env` if present; a missing file is not an error
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => eprintln!("Ignoring unreadable .env file: {}", e),
    }
}

/// Initialise the global tracing subscriber
///
/// `RUST_LOG` wins; otherwise the configured level applies to every target.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
