//! Configuration management for the identicon service

use serde::{Deserialize, Serialize};
use std::{env, fmt, str::FromStr};

use crate::error::AppError;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:30000";
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 86400; // 24 hours
pub const DEFAULT_MAGNIFICATION: u32 = 16;
pub const DEFAULT_CANVAS_SIZE: u32 = 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub cache: CacheConfig,
    pub identicon: IdenticonConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub bind_addr: String,
    pub environment: String,
    pub log_level: String,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Redis,
    Memory,
    None,
}

impl CacheBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheBackend::Redis => "redis",
            CacheBackend::Memory => "memory",
            CacheBackend::None => "none",
        }
    }
}

impl fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(CacheBackend::Redis),
            "memory" => Ok(CacheBackend::Memory),
            "none" | "noop" | "" => Ok(CacheBackend::None),
            other => Err(AppError::configuration(format!(
                "Unknown cache backend '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub redis_url: Option<String>,
    /// Zero means stored images never expire.
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdenticonConfig {
    pub magnification: u32,
    pub canvas_size: u32,
}

impl Default for IdenticonConfig {
    fn default() -> Self {
        Self {
            magnification: DEFAULT_MAGNIFICATION,
            canvas_size: DEFAULT_CANVAS_SIZE,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, so tests don't touch process env.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let redis_url = lookup("REDIS_URL").filter(|url| !url.trim().is_empty());

        // An unknown backend name degrades to no cache, it never blocks startup.
        let backend = match lookup("CACHE_BACKEND") {
            Some(raw) => raw.parse::<CacheBackend>().unwrap_or_else(|e: AppError| {
                tracing::warn!("{}; running without cache", e);
                CacheBackend::None
            }),
            None if redis_url.is_some() => CacheBackend::Redis,
            None => CacheBackend::None,
        };

        Ok(Config {
            app: AppConfig {
                bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
                environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
                log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
                request_timeout_seconds: lookup("REQUEST_TIMEOUT_SECONDS")
                    .unwrap_or_else(|| "30".to_string())
                    .parse()?,
            },
            cache: CacheConfig {
                backend,
                redis_url,
                ttl_seconds: lookup("IDENTICON_CACHE_TTL_SECONDS")
                    .unwrap_or_else(|| DEFAULT_CACHE_TTL_SECONDS.to_string())
                    .parse()?,
            },
            identicon: IdenticonConfig {
                magnification: lookup("IDENTICON_MAGNIFICATION")
                    .unwrap_or_else(|| DEFAULT_MAGNIFICATION.to_string())
                    .parse()?,
                canvas_size: lookup("IDENTICON_CANVAS_SIZE")
                    .unwrap_or_else(|| DEFAULT_CANVAS_SIZE.to_string())
                    .parse()?,
            },
        })
    }
}
