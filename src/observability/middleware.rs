// ============================================================================
// HTTP METRICS MIDDLEWARE
// ============================================================================

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::observability::record_http_request;

/// Records count and latency for every HTTP request
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let endpoint = normalize_path(req.uri().path());

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    record_http_request(&method, &endpoint, response.status().as_u16(), duration);

    response
}

/// Collapses image keys into one label so arbitrary paths can't blow up cardinality
fn normalize_path(path: &str) -> String {
    if path == "/img" || path.starts_with("/img/") {
        return "/img/:key".to_string();
    }
    match path {
        "/health" | "/metrics" | "/metrics/json" => path.to_string(),
        _ => "other".to_string(),
    }
}
