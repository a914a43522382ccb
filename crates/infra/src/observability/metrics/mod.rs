//! Metric collection and publishing
//!
//! Service call metrics (latency, faults) arrive through the core
//! `MetricsSink` port; per-document business metrics are built by
//! [`DocumentMetrics`]. Both end up in a [`BufferedMetricsSink`].

pub mod buffered;
pub mod document;

pub use buffered::{BufferedMetricsSink, MetricsPublisher, TracingMetricsPublisher, MAX_METRIC_BATCH};
pub use document::DocumentMetrics;
