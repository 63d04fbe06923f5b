use async_trait::async_trait;
use dashmap::DashMap;
use shared::{config::CacheConfig, CacheBackend, RedisService, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{debug, info, warn};

// Background cleanup interval for the in-memory backend (every 5 minutes)
const CACHE_CLEANUP_INTERVAL_SECS: u64 = 300;

// ============================================================================
// IMAGE CACHE CONTRACT
// ============================================================================

/// Key/value store for rendered images.
///
/// `load` returns `Ok(None)` for a missing key; `Err` is reserved for a backend
/// that could not answer. Implementations are shared across in-flight requests.
#[async_trait]
pub trait ImageCache: Send + Sync {
    fn backend(&self) -> CacheBackend;

    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn store(&self, key: &str, image: &[u8]) -> Result<()>;

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// Builds the configured backend. Anything that prevents a real cache from
/// working (missing URL, unreachable Redis) yields the no-op cache instead.
pub async fn build_image_cache(config: &CacheConfig) -> Arc<dyn ImageCache> {
    match config.backend {
        CacheBackend::Redis => {
            let Some(url) = config.redis_url.as_deref() else {
                warn!("⚠️ CACHE_BACKEND=redis but REDIS_URL is not set; running without cache");
                return Arc::new(NoopImageCache);
            };
            match RedisService::new(url).await {
                Ok(redis) => {
                    info!("✅ Redis image cache ready (ttl: {}s)", config.ttl_seconds);
                    Arc::new(RedisImageCache::new(redis, config.ttl_seconds))
                }
                Err(e) => {
                    warn!("⚠️ Redis unavailable ({}); running without cache", e);
                    Arc::new(NoopImageCache)
                }
            }
        }
        CacheBackend::Memory => {
            info!("🧠 In-memory image cache ready (ttl: {}s)", config.ttl_seconds);
            let cache = Arc::new(MemoryImageCache::with_ttl_seconds(config.ttl_seconds));
            if config.ttl_seconds > 0 {
                MemoryImageCache::start_background_cleanup(cache.clone());
            }
            cache
        }
        CacheBackend::None => {
            info!("ℹ️ No image cache configured; every request renders");
            Arc::new(NoopImageCache)
        }
    }
}

// ============================================================================
// REDIS IMAGE CACHE
// ============================================================================

#[derive(Clone, Debug)]
pub struct RedisImageCache {
    redis: RedisService,
    ttl_seconds: u64,
}

impl RedisImageCache {
    pub fn new(redis: RedisService, ttl_seconds: u64) -> Self {
        Self { redis, ttl_seconds }
    }
}

#[async_trait]
impl ImageCache for RedisImageCache {
    fn backend(&self) -> CacheBackend {
        CacheBackend::Redis
    }

    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.redis.get_bytes(key).await
    }

    async fn store(&self, key: &str, image: &[u8]) -> Result<()> {
        if self.ttl_seconds == 0 {
            self.redis.set_bytes(key, image).await
        } else {
            self.redis.set_bytes_ex(key, image, self.ttl_seconds).await
        }
    }

    async fn health_check(&self) -> Result<()> {
        self.redis.health_check().await
    }
}

// ============================================================================
// IN-MEMORY IMAGE CACHE
// ============================================================================

#[derive(Clone)]
struct CacheEntry {
    image: Vec<u8>,
    expiry: Option<Instant>,
}

#[derive(Clone, Default)]
pub struct MemoryImageCache {
    store: Arc<DashMap<String, CacheEntry>>,
    ttl: Option<Duration>,
}

impl MemoryImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero keeps entries forever.
    pub fn with_ttl_seconds(ttl_seconds: u64) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            ttl: (ttl_seconds > 0).then(|| Duration::from_secs(ttl_seconds)),
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.store.contains_key(key)
    }

    /// Remove all expired entries from the cache
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let before_count = self.store.len();
        self.store
            .retain(|_, entry| entry.expiry.map_or(true, |expiry| expiry > now));
        let removed = before_count - self.store.len();
        if removed > 0 {
            debug!("🧹 Image cache cleanup: removed {} expired entries", removed);
        }
        removed
    }

    /// Start background cleanup task
    pub fn start_background_cleanup(cache: Arc<Self>) {
        tokio::spawn(async move {
            let mut cleanup_interval = interval(Duration::from_secs(CACHE_CLEANUP_INTERVAL_SECS));
            info!("🔄 Started background image cache cleanup (interval: {}s)", CACHE_CLEANUP_INTERVAL_SECS);

            loop {
                cleanup_interval.tick().await;
                cache.cleanup_expired();
            }
        });
    }
}

#[async_trait]
impl ImageCache for MemoryImageCache {
    fn backend(&self) -> CacheBackend {
        CacheBackend::Memory
    }

    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        {
            let Some(entry) = self.store.get(key) else {
                return Ok(None);
            };
            if entry.expiry.map_or(true, |expiry| expiry > Instant::now()) {
                return Ok(Some(entry.image.clone()));
            }
        }
        // Expired; the read guard is released before removing
        self.store.remove(key);
        Ok(None)
    }

    async fn store(&self, key: &str, image: &[u8]) -> Result<()> {
        let entry = CacheEntry {
            image: image.to_vec(),
            expiry: self.ttl.map(|ttl| Instant::now() + ttl),
        };
        self.store.insert(key.to_string(), entry);
        Ok(())
    }
}

// ============================================================================
// NO-OP IMAGE CACHE
// ============================================================================

/// Stands in when no cache is configured: never finds anything, accepts every store.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopImageCache;

#[async_trait]
impl ImageCache for NoopImageCache {
    fn backend(&self) -> CacheBackend {
        CacheBackend::None
    }

    async fn load(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn store(&self, _key: &str, _image: &[u8]) -> Result<()> {
        Ok(())
    }
}
