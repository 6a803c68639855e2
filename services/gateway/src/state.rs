use std::sync::Arc;

use ingestion::{FeedClient, FetchError, Ingestor, Scheduler};
use persistence::{MemoryStore, PostgresConfig, PostgresStore, StoreError, StoreHandle};
use tracing::{info, warn};

use crate::config::{GatewayConfig, StoreBackend};

#[derive(Clone)]
pub struct AppState {
    pub store: StoreHandle,
    /// Present only when storage is configured
    pub scheduler: Option<Arc<Scheduler>>,
}

impl AppState {
    pub fn new(store: StoreHandle, scheduler: Option<Arc<Scheduler>>) -> Self {
        Self { store, scheduler }
    }

    /// Store handle plus, when storage is available, an ingestion
    /// scheduler over the configured feed origin.
    pub async fn from_config(config: &GatewayConfig) -> Result<Self, StartupError> {
        let store = connect_store(config).await?;
        let scheduler = match store.store() {
            Ok(backend) => {
                let client = FeedClient::new(config.feed_base_url.clone(), config.feed_timeout)?;
                let ingestor = Ingestor::new(Arc::new(client), backend);
                Some(Arc::new(Scheduler::new(ingestor, config.fetch_interval)))
            }
            Err(_) => None,
        };
        Ok(Self::new(store, scheduler))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("feed client: {0}")]
    Feed(#[from] FetchError),
}

async fn connect_store(config: &GatewayConfig) -> Result<StoreHandle, StoreError> {
    match (config.backend, &config.database_url) {
        (StoreBackend::Memory, _) => {
            info!("Using in-memory store; records are lost on restart");
            Ok(StoreHandle::ready(MemoryStore::new()))
        }
        (StoreBackend::Postgres, None) => {
            warn!("DATABASE_URL not set; storage unconfigured, ingestion disabled");
            Ok(StoreHandle::Unconfigured)
        }
        (StoreBackend::Postgres, Some(url)) => {
            let pg = PostgresConfig {
                max_connections: config.max_connections,
                ..PostgresConfig::new(url.clone())
            };
            Ok(StoreHandle::ready(PostgresStore::connect(&pg).await?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_without_database_url() {
        let state = AppState::from_config(&GatewayConfig::default()).await.unwrap();
        assert!(!state.store.is_configured());
        assert!(state.scheduler.is_none());
    }

    #[tokio::test]
    async fn test_memory_backend_starts_scheduler() {
        let config = GatewayConfig {
            backend: StoreBackend::Memory,
            ..GatewayConfig::default()
        };
        let state = AppState::from_config(&config).await.unwrap();
        assert_eq!(state.store.mode(), "memory");
        let scheduler = state.scheduler.unwrap();
        assert_eq!(scheduler.interval(), config.fetch_interval);
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn test_unreachable_database_still_starts() {
        let config = GatewayConfig {
            database_url: Some("postgres://quakes@127.0.0.1:1/quakes".to_string()),
            ..GatewayConfig::default()
        };
        let state = AppState::from_config(&config).await.unwrap();
        assert_eq!(state.store.mode(), "postgres");
        assert!(state.scheduler.is_some());
        assert!(state.store.store().unwrap().latest().await.is_err());
    }
}
