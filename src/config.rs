use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for the Cultural Navigator service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub assistant: AssistantConfig,
    pub polling: PollingConfig,
    pub redis: RedisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    /// host:port the HTTP API binds to
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    pub api_key: String,
    /// Pre-trained assistant the runs are started against
    pub assistant_id: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Fixed interval between run status checks
    pub interval_ms: u64,
    /// Upper bound on status checks before the call is classified as timed out
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub database: u8,
    pub pool: PoolConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    pub max_size: usize,
    pub timeout_seconds: u64,
    pub create_timeout_seconds: u64,
    pub recycle_timeout_seconds: u64,
}

impl Config {
    /// Load configuration from file with environment variable overrides
    /// ALWAYS returns a valid config - never fails
    pub fn load() -> Self {
        if dotenvy::dotenv().is_ok() {
            tracing::info!("Loaded .env from current directory");
        }

        // Default config path
        let config_path =
            env::var("NAVIGATOR_CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

        // Load config from file if it exists
        let mut config = if Path::new(&config_path).exists() {
            match fs::read_to_string(&config_path) {
                Ok(contents) => match serde_yaml::from_str::<Config>(&contents) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from {}", config_path);
                        config
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to parse config file {}: {} - using defaults",
                            config_path,
                            e
                        );
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::error!(
                        "Failed to read config file {}: {} - using defaults",
                        config_path,
                        e
                    );
                    Self::default()
                }
            }
        } else {
            tracing::warn!("Config file not found at {} - using defaults", config_path);
            Self::default()
        };

        // Apply environment variable overrides
        config.apply_env_overrides();

        // Validate configuration - log warnings but don't fail
        if let Err(e) = config.validate() {
            tracing::warn!("Config validation warnings: {} - continuing anyway", e);
        }

        config
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Server overrides
        if let Ok(name) = env::var("NAVIGATOR_SERVER_NAME") {
            self.server.name = name;
        }
        if let Ok(bind) = env::var("NAVIGATOR_HTTP_BIND") {
            self.server.bind = bind;
        }

        // Assistant backend overrides
        if let Ok(api_key) = env::var("OPENAI_API_KEY") {
            self.assistant.api_key = api_key;
        }
        if let Ok(assistant_id) = env::var("NAVIGATOR_ASSISTANT_ID") {
            self.assistant.assistant_id = assistant_id;
        }
        if let Ok(base_url) = env::var("NAVIGATOR_ASSISTANT_BASE_URL") {
            self.assistant.base_url = base_url;
        }

        // Polling overrides
        if let Ok(interval) = env::var("NAVIGATOR_POLL_INTERVAL_MS") {
            if let Ok(ms) = interval.parse() {
                self.polling.interval_ms = ms;
            }
        }
        if let Ok(attempts) = env::var("NAVIGATOR_POLL_MAX_ATTEMPTS") {
            if let Ok(max) = attempts.parse() {
                self.polling.max_attempts = max;
            }
        }

        // Redis overrides
        if let Ok(host) = env::var("REDIS_HOST") {
            self.redis.host = host;
        }
        if let Ok(port) = env::var("REDIS_PORT") {
            if let Ok(port_num) = port.parse() {
                self.redis.port = port_num;
            }
        }
        if let Ok(db) = env::var("REDIS_DB") {
            if let Ok(db_num) = db.parse() {
                self.redis.database = db_num;
            }
        }
        if let Ok(pool_size) = env::var("NAVIGATOR_REDIS_POOL_SIZE") {
            if let Ok(size) = pool_size.parse() {
                self.redis.pool.max_size = size;
            }
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.redis.port == 0 {
            return Err("Redis port cannot be 0".into());
        }

        if self.polling.interval_ms == 0 {
            return Err("Polling interval cannot be 0".into());
        }
        if self.polling.max_attempts == 0 {
            return Err("Polling max_attempts cannot be 0".into());
        }

        if self.assistant.api_key.is_empty() {
            return Err("OPENAI_API_KEY environment variable must be set".into());
        }
        if self.assistant.assistant_id.is_empty() {
            return Err("Assistant id must be set".into());
        }

        Ok(())
    }

    /// Get Redis URL with password from environment
    pub fn get_redis_url(&self) -> String {
        let password = env::var("REDIS_PASSWORD").unwrap_or_else(|_| {
            tracing::warn!("REDIS_PASSWORD not set, assuming no password for local development.");
            "".to_string()
        });

        if password.is_empty() {
            format!(
                "redis://{}:{}/{}",
                self.redis.host, self.redis.port, self.redis.database
            )
        } else {
            format!(
                "redis://:{}@{}:{}/{}",
                password, self.redis.host, self.redis.port, self.redis.database
            )
        }
    }

    /// Get poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.polling.interval_ms)
    }

    /// Get pool timeout as Duration
    pub fn get_pool_timeout(&self) -> Duration {
        Duration::from_secs(self.redis.pool.timeout_seconds)
    }

    /// Get pool create timeout as Duration
    pub fn get_pool_create_timeout(&self) -> Duration {
        Duration::from_secs(self.redis.pool.create_timeout_seconds)
    }

    /// Get pool recycle timeout as Duration
    pub fn get_pool_recycle_timeout(&self) -> Duration {
        Duration::from_secs(self.redis.pool.recycle_timeout_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "cultural-navigator".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                bind: "127.0.0.1:8790".to_string(),
            },
            assistant: AssistantConfig {
                api_key: String::new(),
                assistant_id: String::new(),
                base_url: "https://api.openai.com/v1".to_string(),
            },
            polling: PollingConfig {
                interval_ms: 1000,
                max_attempts: 120,
            },
            redis: RedisConfig {
                host: "127.0.0.1".to_string(),
                port: 6379,
                database: 0,
                pool: PoolConfig {
                    max_size: 16,
                    timeout_seconds: 5,
                    create_timeout_seconds: 5,
                    recycle_timeout_seconds: 5,
                },
            },
        }
    }
}
