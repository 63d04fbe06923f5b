use crate::cache::{build_image_cache, ImageCache};
use crate::domains::identicon::{BitmapGeometry, IdenticonResolver};
use shared::Config;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state.
/// Everything a handler needs is passed in here; nothing lives in globals
/// except the Prometheus collectors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub resolver: Arc<IdenticonResolver>,
    pub started_at: Instant,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let geometry = BitmapGeometry::new(
            config.identicon.magnification,
            config.identicon.canvas_size,
        )?;
        let cache = build_image_cache(&config.cache).await;
        Ok(Self::with_cache(config, cache, geometry)?)
    }

    /// Wires the state around an already-built cache (used by tests and tools).
    pub fn with_cache(
        config: Config,
        cache: Arc<dyn ImageCache>,
        geometry: BitmapGeometry,
    ) -> shared::Result<Self> {
        let resolver = IdenticonResolver::new(cache, geometry)?;
        tracing::info!(
            "🎨 Identicon resolver ready ({}x{} grid on {}px canvas, cache: {})",
            geometry.magnification,
            geometry.magnification,
            geometry.canvas_size,
            resolver.cache().backend()
        );
        Ok(Self {
            config,
            resolver: Arc::new(resolver),
            started_at: Instant::now(),
        })
    }
}
