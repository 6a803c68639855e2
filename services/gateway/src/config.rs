use std::str::FromStr;
use std::time::Duration;

use ingestion::{DEFAULT_FEED_BASE_URL, DEFAULT_FETCH_TIMEOUT};
use thiserror::Error;

/// Invalid configuration; fails startup.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} has invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Which store implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct GatewayConfig {
    pub port: u16,
    pub fetch_interval: Duration,
    pub backend: StoreBackend,
    /// Postgres connection string; absent leaves storage unconfigured
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub feed_base_url: String,
    pub feed_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            fetch_interval: Duration::from_secs(5 * 60),
            backend: StoreBackend::Postgres,
            database_url: None,
            max_connections: 5,
            feed_base_url: DEFAULT_FEED_BASE_URL.to_string(),
            feed_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

// Credentials stay out of logs.
impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("port", &self.port)
            .field("fetch_interval", &self.fetch_interval)
            .field("backend", &self.backend)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("max_connections", &self.max_connections)
            .field("feed_base_url", &self.feed_base_url)
            .field("feed_timeout", &self.feed_timeout)
            .finish()
    }
}

impl GatewayConfig {
    /// Read the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let port = match get("PORT") {
            Some(raw) => parse_number::<u16>("PORT", raw)?,
            None => defaults.port,
        };

        let fetch_interval = match get("FETCH_INTERVAL_MINUTES") {
            Some(raw) => {
                let minutes = parse_number::<u64>("FETCH_INTERVAL_MINUTES", raw.clone())?;
                if minutes == 0 {
                    return Err(ConfigError::Invalid {
                        key: "FETCH_INTERVAL_MINUTES",
                        value: raw,
                        reason: "must be at least 1",
                    });
                }
                Duration::from_secs(minutes * 60)
            }
            None => defaults.fetch_interval,
        };

        let backend = match get("STORE_BACKEND") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: "STORE_BACKEND",
                value: raw,
                reason: "expected \"postgres\" or \"memory\"",
            })?,
            None => defaults.backend,
        };

        let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => parse_number::<u32>("DATABASE_MAX_CONNECTIONS", raw)?,
            None => defaults.max_connections,
        };

        let feed_timeout = match get("FEED_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number::<u64>("FEED_TIMEOUT_SECS", raw)?),
            None => defaults.feed_timeout,
        };

        Ok(Self {
            port,
            fetch_interval,
            backend,
            database_url: get("DATABASE_URL"),
            max_connections,
            feed_base_url: get("FEED_BASE_URL").unwrap_or(defaults.feed_base_url),
            feed_timeout,
        })
    }
}

fn parse_number<T: FromStr>(key: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw,
        reason: "expected a non-negative integer",
    })
}
