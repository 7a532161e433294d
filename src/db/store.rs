// Key-value store abstraction used by the link and job status services
// Redis backs production; MemoryStore backs local runs and tests

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::utils::ServiceResult;

/// Health check status for the backing store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreHealth {
    pub backend: String,
    pub is_healthy: bool,
    pub latency_ms: u64,
    pub error: Option<String>,
}

/// Ordered key-value store with single-key operations.
///
/// Every operation is atomic for a single key. Nothing spans several keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, if any
    async fn get(&self, key: &str) -> ServiceResult<Option<String>>;

    /// Insert or overwrite `key`
    async fn set(&self, key: &str, value: &str) -> ServiceResult<()>;

    /// Remove `key`; removing a missing key is a no-op
    async fn delete(&self, key: &str) -> ServiceResult<()>;

    /// All entries whose key starts with `prefix`, sorted by key
    async fn list(&self, prefix: &str) -> ServiceResult<Vec<(String, String)>>;

    /// Probe the backend
    async fn health_check(&self) -> StoreHealth;
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// In-process store. Data lives as long as the process does.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys across all namespaces
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> ServiceResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> ServiceResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> ServiceResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> ServiceResult<Vec<(String, String)>> {
        let entries = self.entries.read().await;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    async fn health_check(&self) -> StoreHealth {
        let start = Instant::now();
        let _ = self.entries.read().await.len();
        StoreHealth {
            backend: "memory".to_string(),
            is_healthy: true,
            latency_ms: start.elapsed().as_millis() as u64,
            error: None,
        }
    }
}
