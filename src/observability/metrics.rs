//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_notifications_total` (counter): ingestion results by outcome
//! - `gateway_ingest_duration_seconds` (histogram): end-to-end ingestion latency
//! - `gateway_anchor_transitions_total` (counter): anchoring state entries by state
//! - `gateway_confirmation_wait_seconds` (histogram): time to observe a write, by stage and result
//! - `gateway_ledger_calls_total` (counter): ledger RPCs by call and result
//! - `gateway_ledger_call_duration_seconds` (histogram): ledger RPC latency
//! - `gateway_storage_writes_total` (counter): storage writes by backend and result
//! - `gateway_storage_write_duration_seconds` (histogram): storage write latency

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_notification(outcome: &'static str, elapsed: Duration) {
    counter!("gateway_notifications_total", "outcome" => outcome).increment(1);
    histogram!("gateway_ingest_duration_seconds", "outcome" => outcome)
        .record(elapsed.as_secs_f64());
}

pub fn record_anchor_transition(state: &'static str) {
    counter!("gateway_anchor_transitions_total", "state" => state).increment(1);
}

pub fn record_confirmation_wait(stage: &'static str, result: &'static str, waited: Duration) {
    histogram!(
        "gateway_confirmation_wait_seconds",
        "stage" => stage,
        "result" => result
    )
    .record(waited.as_secs_f64());
}

pub fn record_ledger_call(call: &'static str, success: bool, elapsed: Duration) {
    let result = if success { "ok" } else { "error" };
    counter!("gateway_ledger_calls_total", "call" => call, "result" => result).increment(1);
    histogram!("gateway_ledger_call_duration_seconds", "call" => call)
        .record(elapsed.as_secs_f64());
}

pub fn record_storage_write(backend: &'static str, success: bool, elapsed: Duration) {
    let result = if success { "ok" } else { "error" };
    counter!("gateway_storage_writes_total", "backend" => backend, "result" => result)
        .increment(1);
    histogram!("gateway_storage_write_duration_seconds", "backend" => backend)
        .record(elapsed.as_secs_f64());
}
