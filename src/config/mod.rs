//! Configuration module for the CMS admin backend.
//!
//! All configuration is loaded from environment variables with sensible defaults and
//! passed explicitly to the components that need it.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::AppError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Listing cache time-to-live in seconds; 0 disables the cache entirely
    pub cache_ttl_secs: u64,
    /// Maximum number of cached listing entries
    pub cache_max_capacity: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/cms.sqlite"),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            log_level: "info".to_string(),
            cache_ttl_secs: 300,
            cache_max_capacity: 10_000,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let db_path = env::var("CMS_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let bind_addr = match env::var("CMS_BIND_ADDR") {
            Ok(raw) => raw.parse().map_err(|_| {
                AppError::InvalidArgument(format!("Invalid CMS_BIND_ADDR format: {}", raw))
            })?,
            Err(_) => defaults.bind_addr,
        };

        let log_level = env::var("CMS_LOG_LEVEL").unwrap_or(defaults.log_level);

        let cache_ttl_secs = parse_u64("CMS_CACHE_TTL_SECS", defaults.cache_ttl_secs)?;
        let cache_max_capacity =
            parse_u64("CMS_CACHE_MAX_CAPACITY", defaults.cache_max_capacity)?;

        Ok(Self {
            db_path,
            bind_addr,
            log_level,
            cache_ttl_secs,
            cache_max_capacity,
        })
    }

    /// Listing cache time-to-live, `None` when caching is switched off.
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }
}

fn parse_u64(name: &str, default: u64) -> Result<u64, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::InvalidArgument(format!("Invalid {} value: {}", name, raw))),
        Err(_) => Ok(default),
    }
}
