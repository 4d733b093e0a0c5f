//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_events_total` (counter): handled events by event name, outcome
//! - `relay_event_duration_seconds` (histogram): time from frame to response
//! - `relay_submissions_total` (counter): writes by contract function, outcome
//! - `relay_active_sessions` (gauge): connected WebSocket clients
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one handled client event.
pub fn record_event(event: &'static str, success: bool, started: Instant) {
    let outcome = if success { "success" } else { "failure" };
    counter!("relay_events_total", "event" => event, "outcome" => outcome).increment(1);
    histogram!("relay_event_duration_seconds", "event" => event).record(started.elapsed().as_secs_f64());
}

/// Record the outcome of one write submission.
pub fn record_submission(function: &'static str, outcome: &'static str) {
    counter!("relay_submissions_total", "function" => function, "outcome" => outcome).increment(1);
}

pub fn set_active_sessions(count: u64) {
    gauge!("relay_active_sessions").set(count as f64);
}
