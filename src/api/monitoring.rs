use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;

use crate::state::AppState;

/// Health, Prometheus and JSON stats endpoints
pub fn monitoring_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(prometheus_metrics))
        .route("/metrics/json", get(json_metrics))
}

/// Reports "degraded" when the cache backend doesn't answer; the service
/// itself keeps rendering either way.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cache = state.resolver.cache();
    let (cache_status, cache_error) = match cache.health_check().await {
        Ok(()) => ("healthy", None),
        Err(e) => ("unhealthy", Some(e.to_string())),
    };
    let status = if cache_error.is_none() { "healthy" } else { "degraded" };

    let health = serde_json::json!({
        "status": status,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": "imgret",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "cache": {
            "backend": cache.backend().as_str(),
            "status": cache_status,
            "error": cache_error,
        },
    });

    (StatusCode::OK, Json(health))
}

async fn prometheus_metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics".to_string())
            .into_response();
    }

    (
        StatusCode::OK,
        [("content-type", encoder.format_type().to_string())],
        String::from_utf8(buffer).unwrap_or_default(),
    )
        .into_response()
}

/// Resolver counters for this process
async fn json_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "identicon": state.resolver.stats(),
        "cache_backend": state.resolver.cache().backend().as_str(),
    }))
}
