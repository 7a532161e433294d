// Centralized configuration management
// Load ALL env vars ONCE at startup

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Admin token used when `ADMIN_TOKEN` is not set
pub const FALLBACK_ADMIN_TOKEN: &str = "fallback-admin-token";

/// Log filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "streamtape_keeper=debug,tower_http=info";

/// Upper bound for `SWEEP_INTERVAL_MINUTES` (one year)
pub const MAX_SWEEP_INTERVAL_MINUTES: u64 = 525_600;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Global application configuration loaded once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    // For tests, load .env file first
    #[cfg(test)]
    dotenv::dotenv().ok();

    AppConfig::from_env().expect("Failed to load configuration")
});

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub admin_token: String,
    pub store_backend: StoreBackend,
    pub redis: RedisConfig,
    pub sweep: SweepConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub environment: Environment,
    pub rust_log: String,
}

/// Environment type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "test" => Environment::Test,
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which key-value store backs the link list
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum StoreBackend {
    Redis,
    /// In-process map, lost on restart
    Memory,
}

impl StoreBackend {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::InvalidValue(
                "STORE_BACKEND".to_string(),
                format!("expected 'redis' or 'memory', got '{}'", other),
            )),
        }
    }
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub pool_size: u32,
    pub connection_timeout: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
}

/// HTTP method used for keep-alive pings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum PingMethod {
    Head,
    /// GET, dropped as soon as the response headers arrive
    Get,
}

impl PingMethod {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_lowercase().as_str() {
            "head" => Ok(PingMethod::Head),
            "get" => Ok(PingMethod::Get),
            other => Err(ConfigError::InvalidValue(
                "PING_METHOD".to_string(),
                format!("expected 'head' or 'get', got '{}'", other),
            )),
        }
    }
}

/// Keeper sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    pub ping_method: PingMethod,
    pub ping_delay_ms: u64,
    pub ping_timeout_secs: u64,
    /// 0 disables the scheduled sweep
    pub interval_minutes: u64,
}

impl SweepConfig {
    pub fn ping_delay(&self) -> Duration {
        Duration::from_millis(self.ping_delay_ms)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout_secs)
    }

    pub fn interval(&self) -> Option<Duration> {
        if self.interval_minutes == 0 {
            None
        } else {
            Some(Duration::from_secs(self.interval_minutes.saturating_mul(60)))
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "0.0.0.0:8080".to_string(),
                environment: Environment::Development,
                rust_log: DEFAULT_LOG_FILTER.to_string(),
            },
            admin_token: FALLBACK_ADMIN_TOKEN.to_string(),
            store_backend: StoreBackend::Redis,
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                pool_size: 4,
                connection_timeout: 5,
                retry_attempts: 3,
                retry_delay_ms: 100,
            },
            sweep: SweepConfig {
                ping_method: PingMethod::Head,
                ping_delay_ms: 1000,
                ping_timeout_secs: 30,
                interval_minutes: 1440,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Helper function to get optional env var with default
        let get_or_default = |key: &str, default: &str| -> String {
            env::var(key).unwrap_or_else(|_| default.to_string())
        };

        // Helper function to parse env var with default
        let parse_or_default = |key: &str, default: &str| -> Result<u32, ConfigError> {
            get_or_default(key, default).parse().map_err(|_| {
                ConfigError::InvalidValue(key.to_string(), "not a valid u32".to_string())
            })
        };

        let parse_u64_or_default = |key: &str, default: &str| -> Result<u64, ConfigError> {
            get_or_default(key, default).parse().map_err(|_| {
                ConfigError::InvalidValue(key.to_string(), "not a valid u64".to_string())
            })
        };

        let bind_address = get_or_default("BIND_ADDRESS", "0.0.0.0:8080");

        let environment = Environment::from(get_or_default("ENVIRONMENT", "development"));
        let rust_log = get_or_default("RUST_LOG", DEFAULT_LOG_FILTER);

        let admin_token = match env::var("ADMIN_TOKEN") {
            Ok(token) if !token.is_empty() => token,
            _ => FALLBACK_ADMIN_TOKEN.to_string(),
        };

        let store_backend = StoreBackend::parse(&get_or_default("STORE_BACKEND", "redis"))?;

        let redis = RedisConfig {
            url: get_or_default("REDIS_URL", "redis://localhost:6379"),
            pool_size: parse_or_default("REDIS_POOL_SIZE", "4")?,
            connection_timeout: parse_u64_or_default("REDIS_CONNECTION_TIMEOUT", "5")?,
            retry_attempts: parse_or_default("REDIS_RETRY_ATTEMPTS", "3")?,
            retry_delay_ms: parse_u64_or_default("REDIS_RETRY_DELAY_MS", "100")?,
        };

        let sweep = SweepConfig {
            ping_method: PingMethod::parse(&get_or_default("PING_METHOD", "head"))?,
            ping_delay_ms: parse_u64_or_default("PING_DELAY_MS", "1000")?,
            ping_timeout_secs: parse_u64_or_default("PING_TIMEOUT_SECS", "30")?,
            interval_minutes: parse_u64_or_default("SWEEP_INTERVAL_MINUTES", "1440")?,
        };

        if sweep.ping_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "PING_TIMEOUT_SECS".to_string(),
                "must be greater than 0".to_string(),
            ));
        }

        if sweep.interval_minutes > MAX_SWEEP_INTERVAL_MINUTES {
            return Err(ConfigError::InvalidValue(
                "SWEEP_INTERVAL_MINUTES".to_string(),
                format!("must be at most {}", MAX_SWEEP_INTERVAL_MINUTES),
            ));
        }

        Ok(Self {
            server: ServerConfig {
                bind_address,
                environment,
                rust_log,
            },
            admin_token,
            store_backend,
            redis,
            sweep,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.server.environment == Environment::Production
    }

    /// Whether the operator left the admin token at its built-in value
    pub fn uses_fallback_token(&self) -> bool {
        self.admin_token == FALLBACK_ADMIN_TOKEN
    }
}

/// Get the global configuration instance
pub fn config() -> &'static AppConfig {
    &CONFIG
}
