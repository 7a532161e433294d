use async_trait::async_trait;
use rand::{thread_rng, Rng};
use redis::{aio::ConnectionManager, Client, RedisError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{error, info, instrument, warn};

use super::redis_config::RedisConfig;
use super::store::{KeyValueStore, StoreHealth};
use crate::utils::ServiceResult;

/// Maximum delay cap for exponential backoff to prevent extremely long waits
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Keys fetched per SCAN round trip
const SCAN_BATCH: usize = 200;

/// Redis connection pool.
///
/// Each `ConnectionManager` is multiplexed and reconnects on its own, so the
/// pool hands out clones round-robin instead of checking connections in and out.
#[derive(Clone)]
pub struct RedisPool {
    connections: Arc<Vec<ConnectionManager>>,
    next: Arc<AtomicUsize>,
}

impl RedisPool {
    /// Create a new Redis connection pool with retry logic
    #[instrument(skip(config))]
    pub async fn new(config: RedisConfig) -> Result<Self, RedisError> {
        config.validate().map_err(|e| {
            error!("Invalid Redis configuration: {}", e);
            RedisError::from((
                redis::ErrorKind::InvalidClientConfig,
                "Invalid configuration",
                e,
            ))
        })?;

        info!("Initializing Redis connection pool");
        info!("Redis URL: {}", mask_redis_url(&config.redis_url));
        info!("Pool size: {}", config.pool_size);

        let client = Client::open(config.redis_url.as_str())?;

        let mut connections = Vec::with_capacity(config.pool_size as usize);
        for i in 0..config.pool_size {
            match Self::create_connection_with_retry(&client, &config).await {
                Ok(conn) => connections.push(conn),
                Err(e) => {
                    warn!("Failed to create connection {}: {}", i, e);
                    if connections.is_empty() {
                        return Err(e);
                    }
                },
            }
        }

        info!("Redis pool initialized with {} connections", connections.len());
        Ok(Self {
            connections: Arc::new(connections),
            next: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Create a connection with retry logic
    async fn create_connection_with_retry(
        client: &Client,
        config: &RedisConfig,
    ) -> Result<ConnectionManager, RedisError> {
        let mut retry_count = 0;
        let mut delay = config.retry_delay;

        loop {
            let attempt = timeout(
                config.connection_timeout,
                ConnectionManager::new(client.clone()),
            )
            .await
            .unwrap_or_else(|_| {
                Err(RedisError::from((
                    redis::ErrorKind::IoError,
                    "Connection timeout",
                )))
            });

            match attempt {
                Ok(conn) => return Ok(conn),
                Err(e) if retry_count < config.retry_attempts => {
                    warn!(
                        "Failed to create Redis connection (attempt {}/{}): {}",
                        retry_count + 1,
                        config.retry_attempts,
                        e
                    );

                    sleep(delay).await;

                    // Exponential backoff with jitter and maximum delay cap
                    let jitter = thread_rng().gen_range(0..100);
                    delay =
                        std::cmp::min(delay * 2 + Duration::from_millis(jitter), MAX_RETRY_DELAY);
                    retry_count += 1;
                },
                Err(e) => {
                    error!(
                        "Failed to create Redis connection after {} attempts",
                        config.retry_attempts
                    );
                    return Err(e);
                },
            }
        }
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> ConnectionManager {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.connections.len();
        self.connections[index].clone()
    }

    /// Get a string value by key
    pub async fn get(&self, key: &str) -> Result<Option<String>, RedisError> {
        let mut conn = self.get_connection();
        redis::cmd("GET")
            .arg(key)
            .query_async::<Option<String>>(&mut conn)
            .await
    }

    /// Set a value without expiry
    pub async fn set(&self, key: &str, value: &str) -> Result<(), RedisError> {
        let mut conn = self.get_connection();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
    }

    /// Delete a key from Redis
    pub async fn del(&self, key: &str) -> Result<(), RedisError> {
        let mut conn = self.get_connection();
        redis::cmd("DEL").arg(key).query_async::<()>(&mut conn).await
    }

    /// All keys starting with `prefix`, sorted lexicographically.
    ///
    /// SCAN order is unspecified, so keys are sorted here to give callers the
    /// ordered iteration a hierarchical key-value store would.
    pub async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, RedisError> {
        let mut conn = self.get_connection();
        let pattern = format!("{}*", escape_glob(prefix));
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async::<(u64, Vec<String>)>(&mut conn)
                .await?;

            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    /// Values for several keys in one round trip
    pub async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, RedisError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.get_connection();
        redis::cmd("MGET")
            .arg(keys)
            .query_async::<Vec<Option<String>>>(&mut conn)
            .await
    }
}

#[async_trait]
impl KeyValueStore for RedisPool {
    async fn get(&self, key: &str) -> ServiceResult<Option<String>> {
        Ok(RedisPool::get(self, key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> ServiceResult<()> {
        Ok(RedisPool::set(self, key, value).await?)
    }

    async fn delete(&self, key: &str) -> ServiceResult<()> {
        Ok(self.del(key).await?)
    }

    async fn list(&self, prefix: &str) -> ServiceResult<Vec<(String, String)>> {
        let keys = self.scan_prefix(prefix).await?;
        let values = self.mget(&keys).await?;

        // A key deleted between SCAN and MGET comes back as nil and is skipped
        Ok(keys
            .into_iter()
            .zip(values)
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect())
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> StoreHealth {
        let start = Instant::now();
        let mut conn = self.get_connection();

        match redis::cmd("PING").query_async::<String>(&mut conn).await {
            Ok(_) => StoreHealth {
                backend: "redis".to_string(),
                is_healthy: true,
                latency_ms: start.elapsed().as_millis() as u64,
                error: None,
            },
            Err(e) => {
                error!("Redis health check failed: {}", e);
                StoreHealth {
                    backend: "redis".to_string(),
                    is_healthy: false,
                    latency_ms: start.elapsed().as_millis() as u64,
                    error: Some(e.to_string()),
                }
            },
        }
    }
}

/// Escape Redis glob metacharacters so a prefix matches literally
fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Mask Redis URL for logging
fn mask_redis_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let host = parsed.host_str().unwrap_or("***");
        let port = parsed.port().unwrap_or(6379);

        // Check if URL has authentication
        if !parsed.username().is_empty() || parsed.password().is_some() {
            format!("redis://***:***@{}:{}", host, port)
        } else {
            format!("redis://{}:{}", host, port)
        }
    } else {
        // Don't expose any part of invalid URL
        "redis://***:***@***:***".to_string()
    }
}
