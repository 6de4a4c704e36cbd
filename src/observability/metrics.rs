//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_migrator_api_calls_total` (counter): platform calls by step, outcome
//! - `edge_migrator_api_call_duration_seconds` (histogram): platform call latency by step
//! - `edge_migrator_deploys_total` (counter): deployments by outcome
//!
//! # Design Decisions
//! - The exporter is optional; without it the macros record nothing

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::deploy::DeployStep;

pub const API_CALLS_TOTAL: &str = "edge_migrator_api_calls_total";
pub const API_CALL_DURATION: &str = "edge_migrator_api_call_duration_seconds";
pub const DEPLOYS_TOTAL: &str = "edge_migrator_deploys_total";

/// Start the Prometheus scrape listener and install the global recorder.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!(API_CALLS_TOTAL, "Platform API calls by deploy step and outcome");
    describe_histogram!(
        API_CALL_DURATION,
        Unit::Seconds,
        "Platform API call latency by deploy step"
    );
    describe_counter!(DEPLOYS_TOTAL, "Deployments by outcome");

    tracing::info!(metrics_addr = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one platform call made during `step`.
pub fn record_api_call(step: DeployStep, success: bool, started: Instant) {
    let outcome = if success { "success" } else { "error" };
    counter!(API_CALLS_TOTAL, "step" => step.as_str(), "outcome" => outcome).increment(1);
    histogram!(API_CALL_DURATION, "step" => step.as_str()).record(started.elapsed().as_secs_f64());
}

/// Record a finished deployment. `failed_step` is `None` on success.
pub fn record_deploy(failed_step: Option<DeployStep>) {
    match failed_step {
        None => counter!(DEPLOYS_TOTAL, "outcome" => "activated").increment(1),
        Some(step) => {
            counter!(DEPLOYS_TOTAL, "outcome" => "failed", "step" => step.as_str()).increment(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter_is_noop() {
        record_api_call(DeployStep::Clone, true, Instant::now());
        record_deploy(Some(DeployStep::Populate));
        record_deploy(None);
    }
}
