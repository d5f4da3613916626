//! Appliance request metrics
//!
//! Prometheus counters and latency histograms for every round trip the
//! appliance client makes.

use crate::appliance::client::Command;
use crate::error::{Error, Result};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Duration;

/// Metrics for appliance invocations, registered into a caller-owned registry
#[derive(Debug, Clone)]
pub struct ApplianceMetrics {
    /// Invocations by command and outcome status (`ok`, `error`, `failed`)
    requests: IntCounterVec,
    /// Round-trip latency by command
    duration: HistogramVec,
}

impl ApplianceMetrics {
    /// Create the metric families and register them into `registry`
    pub fn register(registry: &Registry) -> Result<Self> {
        let requests = IntCounterVec::new(
            Opts::new(
                "freenas_appliance_requests_total",
                "Total number of FreeNAS appliance requests",
            ),
            &["command", "status"],
        )
        .map_err(metrics_error)?;

        let duration = HistogramVec::new(
            HistogramOpts::new(
                "freenas_appliance_request_duration_seconds",
                "Duration of FreeNAS appliance requests",
            ),
            &["command"],
        )
        .map_err(metrics_error)?;

        registry
            .register(Box::new(requests.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(duration.clone()))
            .map_err(metrics_error)?;

        Ok(Self { requests, duration })
    }

    /// Record one finished invocation
    pub fn observe(&self, command: Command, status: &str, elapsed: Duration) {
        self.requests
            .with_label_values(&[command.as_str(), status])
            .inc();
        self.duration
            .with_label_values(&[command.as_str()])
            .observe(elapsed.as_secs_f64());
    }

    /// Current request count for a command/status pair
    pub fn request_count(&self, command: Command, status: &str) -> u64 {
        self.requests
            .with_label_values(&[command.as_str(), status])
            .get()
    }
}

/// Render every metric in `registry` in the Prometheus text format
pub fn render(registry: &Registry) -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&registry.gather(), &mut buffer)
        .map_err(metrics_error)?;
    String::from_utf8(buffer).map_err(|e| Error::Internal(format!("Metrics encoding error: {}", e)))
}

fn metrics_error(err: prometheus::Error) -> Error {
    Error::Internal(format!("Metrics error: {}", err))
}
