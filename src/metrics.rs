//! Prometheus metrics for the bridge server
//!
//! Exposed on /metrics for Prometheus scraping. `REVERT_FAILURES` and
//! `LOG_APPEND_FAILURES` get dedicated series so pool inconsistency and
//! audit-trail gaps stand out from ordinary transfer failures.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram_vec, Counter,
    CounterVec, Gauge, HistogramVec,
};

lazy_static! {
    pub static ref BRIDGE_REQUESTS: CounterVec = register_counter_vec!(
        "bridge_requests_total",
        "Total bridge requests processed",
        &["status"]
    ).unwrap();

    pub static ref BRIDGE_FAILURES: CounterVec = register_counter_vec!(
        "bridge_failures_total",
        "Bridge failures by error kind",
        &["kind"]
    ).unwrap();

    pub static ref REVERTS: CounterVec = register_counter_vec!(
        "bridge_reverts_total",
        "Compensating reversals attempted",
        &["status"]
    ).unwrap();

    pub static ref REVERT_FAILURES: Counter = register_counter!(
        "bridge_revert_failures_total",
        "Failed compensations leaving funds in the source pool"
    ).unwrap();

    pub static ref LOG_APPEND_FAILURES: Counter = register_counter!(
        "bridge_log_append_failures_total",
        "Audit log appends that failed after a completed transfer"
    ).unwrap();

    pub static ref INFLIGHT_OPERATIONS: Gauge = register_gauge!(
        "bridge_inflight_operations",
        "Bridge operations currently executing"
    ).unwrap();

    pub static ref PROCESSING_SECONDS: HistogramVec = register_histogram_vec!(
        "bridge_processing_seconds",
        "End-to-end bridge operation duration",
        &["status"],
        vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]
    ).unwrap();

    pub static ref UP: Gauge = register_gauge!(
        "bridge_up",
        "Whether the bridge server is up and running"
    ).unwrap();
}

/// Record a settled request
pub fn record_request(success: bool) {
    let status = if success { "success" } else { "error" };
    BRIDGE_REQUESTS.with_label_values(&[status]).inc();
}

/// Record a failure by kind
pub fn record_failure(kind: &str) {
    BRIDGE_FAILURES.with_label_values(&[kind]).inc();
}

/// Record a compensation attempt
pub fn record_revert(success: bool) {
    let status = if success { "success" } else { "failure" };
    REVERTS.with_label_values(&[status]).inc();
    if !success {
        REVERT_FAILURES.inc();
    }
}

/// Record a failed audit log append (degraded success)
pub fn record_log_append_failure() {
    LOG_APPEND_FAILURES.inc();
}

/// Record end-to-end operation duration
pub fn observe_processing(success: bool, seconds: f64) {
    let status = if success { "success" } else { "error" };
    PROCESSING_SECONDS
        .with_label_values(&[status])
        .observe(seconds);
}
