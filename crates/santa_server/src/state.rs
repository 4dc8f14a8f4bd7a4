//! Application state

use std::sync::Arc;
use std::time::Instant;

use santa_core::db::SurrealStore;
use santa_core::{DerangementGenerator, Exchange, SantaStore};

use crate::{config::ServerConfig, error::ServerResult};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub exchange: Arc<Exchange>,
    pub jwt_encoding_key: jsonwebtoken::EncodingKey,
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,
    pub started_at: Instant,
}

/// Open the configured database and wrap it in an [`Exchange`].
pub async fn open_exchange(config: &ServerConfig) -> ServerResult<Arc<Exchange>> {
    let store = SurrealStore::connect(&config.database_config()).await?;
    Ok(Arc::new(Exchange::new(
        Arc::new(store),
        DerangementGenerator::new(config.generator),
    )))
}

impl AppState {
    pub async fn new(config: ServerConfig) -> ServerResult<Self> {
        let exchange = open_exchange(&config).await?;
        Ok(Self::with_exchange(config, exchange))
    }

    /// State over an already opened store
    pub fn with_store(config: ServerConfig, store: Arc<dyn SantaStore>) -> Self {
        let generator = DerangementGenerator::new(config.generator);
        Self::with_exchange(config, Arc::new(Exchange::new(store, generator)))
    }

    pub fn with_exchange(config: ServerConfig, exchange: Arc<Exchange>) -> Self {
        // Create JWT keys
        let jwt_encoding_key = jsonwebtoken::EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let jwt_decoding_key = jsonwebtoken::DecodingKey::from_secret(config.jwt_secret.as_bytes());

        Self {
            config: Arc::new(config),
            exchange,
            jwt_encoding_key,
            jwt_decoding_key,
            started_at: Instant::now(),
        }
    }
}
