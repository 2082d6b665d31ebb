use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            pool_size: default_pool_size(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("apilog.db")
}
fn default_pool_size() -> usize {
    8
}

/// Write path tuning: bounded channel plus batched flushes.
#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default = "default_flush_interval")]
    pub flush_interval_secs: u64,
    #[serde(default = "default_flush_batch_size")]
    pub flush_batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            flush_interval_secs: default_flush_interval(),
            flush_batch_size: default_flush_batch_size(),
        }
    }
}

fn default_channel_capacity() -> usize {
    4096
}
fn default_flush_interval() -> u64 {
    1
}
fn default_flush_batch_size() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
    /// When set, graph data is cached in Redis instead of in-process.
    #[serde(default)]
    pub redis_url: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            max_capacity: default_cache_capacity(),
            redis_url: None,
        }
    }
}

fn default_cache_ttl() -> u64 {
    600
}
fn default_cache_capacity() -> u64 {
    1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_page_size() -> u32 {
    10
}
fn default_max_page_size() -> u32 {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct DemoConfig {
    /// Probability that `/api/helloWorld` answers with a simulated 500.
    #[serde(default = "default_failure_rate")]
    pub failure_rate: f64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            failure_rate: default_failure_rate(),
        }
    }
}

fn default_failure_rate() -> f64 {
    0.2
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.demo.failure_rate) {
            return Err(format!(
                "demo.failure_rate must be between 0 and 1, got {}. \
                 Set it in config.toml or via APILOG__DEMO__FAILURE_RATE env var.",
                self.demo.failure_rate
            ));
        }
        if self.cache.ttl_secs == 0 {
            return Err("cache.ttl_secs must be greater than zero".to_string());
        }
        if self.pipeline.channel_capacity == 0 {
            return Err("pipeline.channel_capacity must be greater than zero".to_string());
        }
        if self.query.max_page_size == 0 || self.query.default_page_size == 0 {
            return Err("query page sizes must be greater than zero".to_string());
        }
        Ok(())
    }

    pub fn load(config_path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();

        let path = config_path.unwrap_or("config.toml");
        builder = builder.add_source(File::with_name(path).required(false));

        // Overlay with environment variables (APILOG__SERVER__PORT=3001, etc.)
        builder = builder.add_source(
            Environment::with_prefix("APILOG")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
