// ============================================================================
// PROMETHEUS METRICS
// ============================================================================
// Collectors live in the default registry and are exported at /metrics.
// Recording is best effort and never fails a request.
// ============================================================================

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter,
    register_int_counter_vec, Histogram, HistogramVec, IntCounter, IntCounterVec,
};

lazy_static! {
    // ========================================================================
    // HTTP REQUEST METRICS
    // ========================================================================

    /// Total HTTP requests by method, endpoint and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "endpoint", "status"]
    )
    .unwrap();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "endpoint"],
        vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // ========================================================================
    // IDENTICON METRICS
    // ========================================================================

    /// Image lookups split by cache outcome (hit / miss)
    pub static ref IDENTICON_CACHE_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "identicon_cache_requests_total",
        "Identicon resolutions by cache outcome",
        &["outcome"]
    )
    .unwrap();

    /// Render + PNG encode latency in milliseconds
    pub static ref IDENTICON_ENCODE_DURATION_MS: Histogram = register_histogram!(
        "identicon_encode_duration_ms",
        "Identicon render and PNG encode duration in milliseconds",
        vec![1.0, 2.5, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0]
    )
    .unwrap();

    pub static ref IDENTICON_CACHE_LOAD_FAILURES_TOTAL: IntCounter = register_int_counter!(
        "identicon_cache_load_failures_total",
        "Cache reads that failed and were treated as misses"
    )
    .unwrap();

    pub static ref IDENTICON_CACHE_STORE_FAILURES_TOTAL: IntCounter = register_int_counter!(
        "identicon_cache_store_failures_total",
        "Cache writes that failed after a fresh render"
    )
    .unwrap();
}

// ============================================================================
// HELPERS
// ============================================================================

/// Record an HTTP request
pub fn record_http_request(method: &str, endpoint: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, status_str.as_str()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, endpoint])
        .observe(duration_secs);
}

/// Record a cache hit/miss for an identicon lookup
pub fn record_identicon_lookup(hit: bool) {
    let outcome = if hit { "hit" } else { "miss" };
    IDENTICON_CACHE_REQUESTS_TOTAL
        .with_label_values(&[outcome])
        .inc();
}

/// Record the time spent rendering and encoding one identicon
pub fn record_identicon_encode(duration_ms: f64) {
    IDENTICON_ENCODE_DURATION_MS.observe(duration_ms);
}

pub fn record_cache_load_failure() {
    IDENTICON_CACHE_LOAD_FAILURES_TOTAL.inc();
}

pub fn record_cache_store_failure() {
    IDENTICON_CACHE_STORE_FAILURES_TOTAL.inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_counters_split_by_outcome() {
        let hits_before = IDENTICON_CACHE_REQUESTS_TOTAL.with_label_values(&["hit"]).get();
        let misses_before = IDENTICON_CACHE_REQUESTS_TOTAL.with_label_values(&["miss"]).get();

        record_identicon_lookup(true);
        record_identicon_lookup(false);
        record_identicon_lookup(false);

        // Other tests share the global registry, so only lower bounds hold.
        assert!(IDENTICON_CACHE_REQUESTS_TOTAL.with_label_values(&["hit"]).get() >= hits_before + 1);
        assert!(IDENTICON_CACHE_REQUESTS_TOTAL.with_label_values(&["miss"]).get() >= misses_before + 2);
    }

    #[test]
    fn test_encode_histogram_observes() {
        let before = IDENTICON_ENCODE_DURATION_MS.get_sample_count();
        record_identicon_encode(12.5);
        assert!(IDENTICON_ENCODE_DURATION_MS.get_sample_count() >= before + 1);
    }
}
