pub mod redis_config;
pub mod redis_pool;
pub mod store;

pub use redis_config::RedisConfig;
pub use redis_pool::RedisPool;
pub use store::{KeyValueStore, MemoryStore, StoreHealth};

use std::sync::Arc;
use tracing::info;

use crate::app_config::{AppConfig, StoreBackend};

/// Open the store selected by configuration
pub async fn init_store(config: &AppConfig) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    match config.store_backend {
        StoreBackend::Redis => {
            let redis_config = RedisConfig::from_app_config(&config.redis);
            let pool = RedisPool::new(redis_config).await?;
            Ok(Arc::new(pool))
        },
        StoreBackend::Memory => {
            info!("Using in-memory store; links will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        },
    }
}
