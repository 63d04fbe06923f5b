use axum::{middleware as axum_middleware, Router};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub mod api;
pub mod cache;
pub mod domains;
pub mod observability;
pub mod state;

use api::{create_api_router, monitoring_router};
use observability::metrics_middleware;
use state::AppState;

pub fn create_app_router(app_state: Arc<AppState>) -> Router {
    let request_timeout = Duration::from_secs(app_state.config.app.request_timeout_seconds);

    Router::new()
        // Image pages
        .merge(create_api_router())
        // Health and metrics
        .merge(monitoring_router())
        .with_state(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(axum_middleware::from_fn(metrics_middleware)),
        )
}
