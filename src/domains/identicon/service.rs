use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;
use shared::{AppError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use super::{render_identicon, BitmapGeometry, DIGEST_LEN};
use crate::cache::ImageCache;
use crate::observability;

/// PNG bytes for one request key. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage(Arc<[u8]>);

impl RenderedImage {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Standard base64, ready to inline in HTML.
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.0)
    }

    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", self.to_base64())
    }
}

impl From<Vec<u8>> for RenderedImage {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheOutcome {
    Hit,
    Miss,
}

impl CacheOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOutcome::Hit => "hit",
            CacheOutcome::Miss => "miss",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub image: RenderedImage,
    pub outcome: CacheOutcome,
}

/// Per-resolver counters, independent of the global Prometheus registry.
#[derive(Debug, Default)]
pub struct ResolverStats {
    hits: AtomicU64,
    misses: AtomicU64,
    encodes: AtomicU64,
    load_failures: AtomicU64,
    store_failures: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolverStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub encodes: u64,
    pub load_failures: u64,
    pub store_failures: u64,
    pub hit_rate: f64,
}

impl ResolverStats {
    pub fn snapshot(&self) -> ResolverStatsSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        ResolverStatsSnapshot {
            hits,
            misses,
            encodes: self.encodes.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            hit_rate: if total > 0 { hits as f64 / total as f64 } else { 0.0 },
        }
    }

    fn record_lookup(&self, outcome: CacheOutcome) {
        match outcome {
            CacheOutcome::Hit => self.hits.fetch_add(1, Ordering::Relaxed),
            CacheOutcome::Miss => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        observability::record_identicon_lookup(outcome == CacheOutcome::Hit);
    }
}

/// Cache-aside resolver: load from cache, otherwise render, store, return.
///
/// There is no per-key locking. Two concurrent misses for the same key both
/// render and both store; the last store wins and both callers get identical
/// bytes because rendering is deterministic.
pub struct IdenticonResolver {
    cache: Arc<dyn ImageCache>,
    geometry: BitmapGeometry,
    stats: Arc<ResolverStats>,
}

impl IdenticonResolver {
    /// Rejects geometries that need more bits than one digest carries.
    pub fn new(cache: Arc<dyn ImageCache>, geometry: BitmapGeometry) -> Result<Self> {
        let required = geometry.required_bytes();
        if required > DIGEST_LEN {
            return Err(AppError::input_too_short(required, DIGEST_LEN));
        }
        Ok(Self {
            cache,
            geometry,
            stats: Arc::new(ResolverStats::default()),
        })
    }

    pub fn cache(&self) -> &Arc<dyn ImageCache> {
        &self.cache
    }

    pub fn geometry(&self) -> BitmapGeometry {
        self.geometry
    }

    pub fn stats(&self) -> ResolverStatsSnapshot {
        self.stats.snapshot()
    }

    pub async fn resolve(&self, key: &str) -> Result<Resolution> {
        match self.cache.load(key).await {
            Ok(Some(bytes)) if !bytes.is_empty() => {
                debug!("🎯 Identicon cache hit for key: {}", key);
                self.stats.record_lookup(CacheOutcome::Hit);
                return Ok(Resolution {
                    image: bytes.into(),
                    outcome: CacheOutcome::Hit,
                });
            }
            Ok(_) => {}
            Err(e) => {
                warn!("⚠️ Cache load failed for key {}: {}; rendering instead", key, e);
                self.stats.load_failures.fetch_add(1, Ordering::Relaxed);
                observability::record_cache_load_failure();
            }
        }

        debug!("Identicon cache miss for key: {}", key);
        self.stats.record_lookup(CacheOutcome::Miss);

        // Detached so the render and its store finish even if the caller is dropped.
        let task = tokio::spawn(compute_and_store(
            Arc::clone(&self.cache),
            Arc::clone(&self.stats),
            self.geometry,
            key.to_string(),
        ));
        let image = task
            .await
            .map_err(|e| AppError::internal(format!("Render task failed: {}", e)))??;

        Ok(Resolution {
            image,
            outcome: CacheOutcome::Miss,
        })
    }
}

/// Miss path: digest, render and encode on the blocking pool, then a best-effort store.
async fn compute_and_store(
    cache: Arc<dyn ImageCache>,
    stats: Arc<ResolverStats>,
    geometry: BitmapGeometry,
    key: String,
) -> Result<RenderedImage> {
    let key_bytes = key.as_bytes().to_vec();
    let start = Instant::now();

    let png = tokio::task::spawn_blocking(move || render_identicon(&key_bytes, geometry))
        .await
        .map_err(|e| AppError::internal(format!("Render task failed: {}", e)))??;

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    stats.encodes.fetch_add(1, Ordering::Relaxed);
    observability::record_identicon_encode(elapsed_ms);
    debug!("Rendered identicon for {} in {:.2}ms", key, elapsed_ms);

    let image = RenderedImage::from(png);
    if let Err(e) = cache.store(&key, image.as_bytes()).await {
        warn!("⚠️ Cache store failed for key {}: {}", key, e);
        stats.store_failures.fetch_add(1, Ordering::Relaxed);
        observability::record_cache_store_failure();
    }

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryImageCache, NoopImageCache};

    fn small_geometry() -> BitmapGeometry {
        BitmapGeometry::new(16, 64).unwrap()
    }

    #[test]
    fn test_rendered_image_transport_encoding() {
        let image = RenderedImage::from(vec![0x89, b'P', b'N', b'G']);
        assert_eq!(image.to_base64(), "iVBORw==");
        assert_eq!(image.data_uri(), "data:image/png;base64,iVBORw==");
        assert_eq!(image.len(), 4);
    }

    #[test]
    fn test_geometry_beyond_digest_is_rejected() {
        let geometry = BitmapGeometry::new(32, 1024).unwrap();
        let err = IdenticonResolver::new(Arc::new(NoopImageCache), geometry)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            AppError::InputTooShort {
                required: 128,
                actual: 32
            }
        ));
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = Arc::new(MemoryImageCache::new());
        let resolver = IdenticonResolver::new(cache.clone(), small_geometry()).unwrap();

        let first = resolver.resolve("/img/hello").await.unwrap();
        assert_eq!(first.outcome, CacheOutcome::Miss);
        assert!(cache.contains_key("/img/hello"));

        let second = resolver.resolve("/img/hello").await.unwrap();
        assert_eq!(second.outcome, CacheOutcome::Hit);
        assert_eq!(first.image, second.image);

        let stats = resolver.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.encodes, 1);
        assert_eq!(stats.hit_rate, 0.5);
    }

    #[tokio::test]
    async fn test_hit_returns_cached_bytes_unchanged() {
        let cache = Arc::new(MemoryImageCache::new());
        cache.store("/img/seeded", b"not really a png").await.unwrap();
        let resolver = IdenticonResolver::new(cache, small_geometry()).unwrap();

        let resolution = resolver.resolve("/img/seeded").await.unwrap();
        assert_eq!(resolution.outcome, CacheOutcome::Hit);
        assert_eq!(resolution.image.as_bytes(), b"not really a png");
        assert_eq!(resolver.stats().encodes, 0);
    }

    #[tokio::test]
    async fn test_empty_cached_value_is_a_miss() {
        let cache = Arc::new(MemoryImageCache::new());
        cache.store("/img/empty", b"").await.unwrap();
        let resolver = IdenticonResolver::new(cache.clone(), small_geometry()).unwrap();

        let resolution = resolver.resolve("/img/empty").await.unwrap();
        assert_eq!(resolution.outcome, CacheOutcome::Miss);
        assert!(!resolution.image.is_empty());
        assert_eq!(
            cache.load("/img/empty").await.unwrap().as_deref(),
            Some(resolution.image.as_bytes())
        );
    }

    #[tokio::test]
    async fn test_noop_cache_always_misses() {
        let resolver = IdenticonResolver::new(Arc::new(NoopImageCache), small_geometry()).unwrap();

        for _ in 0..3 {
            let resolution = resolver.resolve("/img/hello").await.unwrap();
            assert_eq!(resolution.outcome, CacheOutcome::Miss);
        }

        let stats = resolver.stats();
        assert_eq!(stats.misses, 3);
        assert_eq!(stats.encodes, 3);
        assert_eq!(stats.store_failures, 0);
        assert_eq!(stats.load_failures, 0);
    }

    #[tokio::test]
    async fn test_dropped_caller_still_stores_render() {
        let cache = Arc::new(MemoryImageCache::new());
        let resolver = IdenticonResolver::new(cache.clone(), BitmapGeometry::default()).unwrap();

        // The caller gives up long before a full-size render can finish.
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(1),
            resolver.resolve("/img/cancel"),
        )
        .await;

        let deadline = Instant::now() + std::time::Duration::from_secs(5);
        while !cache.contains_key("/img/cancel") && Instant::now() < deadline {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        assert!(cache.contains_key("/img/cancel"));
        assert_eq!(resolver.stats().encodes, 1);
        assert_eq!(resolver.stats().misses, 1);
    }
}
