//! Metrics port - latency and fault observations for external calls
//!
//! Recording is synchronous and cheap: implementations buffer datums and
//! publish them later. Callers log and ignore recording errors so metrics can
//! never fail a request.

use std::time::Duration;

use piiguard_common::observability::{DIMENSION_API, DIMENSION_SERVICE};
use piiguard_common::{MetricDatum, MetricUnit, MetricsResult};
use piiguard_domain::constants::{METRIC_ERROR_COUNT, METRIC_LATENCY};

/// Port trait for recording metric observations
pub trait MetricsSink: Send + Sync {
    /// Record a single datum
    fn record(&self, datum: MetricDatum) -> MetricsResult<()>;

    /// Record how long one call to `service`/`api` took
    fn record_latency(&self, service: &str, api: &str, elapsed: Duration) -> MetricsResult<()> {
        let millis = elapsed.as_secs_f64() * 1000.0;
        self.record(
            MetricDatum::new(METRIC_LATENCY, MetricUnit::Milliseconds, millis)
                .with_dimension(DIMENSION_SERVICE, service)
                .with_dimension(DIMENSION_API, api),
        )
    }

    /// Record the number of faults (retries or a final failure) of one call
    fn record_fault(&self, service: &str, api: &str, count: u32) -> MetricsResult<()> {
        self.record(
            MetricDatum::new(METRIC_ERROR_COUNT, MetricUnit::Count, f64::from(count))
                .with_dimension(DIMENSION_SERVICE, service)
                .with_dimension(DIMENSION_API, api),
        )
    }
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetricsSink;

impl MetricsSink for NoOpMetricsSink {
    fn record(&self, _datum: MetricDatum) -> MetricsResult<()> {
        Ok(())
    }
}
