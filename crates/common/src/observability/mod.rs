//! Metric data types shared by metric producers and publishers.
//!
//! Producers (service adapters, the classification orchestrator) never talk
//! to a metrics backend directly. They hand observations to a sink that turns
//! them into [`MetricDatum`] values; publishers ship those datums in batches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dimension name for the remote service a call went to.
pub const DIMENSION_SERVICE: &str = "Service";
/// Dimension name for the remote API a call went to.
pub const DIMENSION_API: &str = "API";
/// Dimension name for the document language.
pub const DIMENSION_LANGUAGE: &str = "Language";
/// Dimension name for the access point that served the request.
pub const DIMENSION_ACCESS_POINT: &str = "AccessPoint";
/// Dimension name for a PII entity type.
pub const DIMENSION_PII_ENTITY_TYPE: &str = "PiiEntityType";

/// Errors raised while recording or publishing metrics
#[derive(Debug, Error)]
pub enum MetricsError {
    /// The metrics backend rejected or failed to receive a batch
    #[error("failed to publish {count} metric datums: {message}")]
    PublishFailed { count: usize, message: String },

    /// A datum could not be serialized for the backend
    #[error("failed to encode metric datum: {0}")]
    Encoding(String),
}

/// Result alias for metric operations
pub type MetricsResult<T> = Result<T, MetricsError>;

/// Unit attached to a metric datum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricUnit {
    /// Plain count
    Count,
    /// Duration in milliseconds
    Milliseconds,
}

/// Name/value pair that partitions a metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricDimension {
    /// Dimension name, e.g. [`DIMENSION_SERVICE`]
    pub name: String,
    /// Dimension value
    pub value: String,
}

impl MetricDimension {
    /// Create a dimension
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// A single metric observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricDatum {
    /// Metric name, e.g. `Latency`
    pub metric_name: String,
    /// Partitioning dimensions
    pub dimensions: Vec<MetricDimension>,
    /// Unit of `value`
    pub unit: MetricUnit,
    /// Observed value
    pub value: f64,
    /// Observation time
    pub timestamp: DateTime<Utc>,
}

impl MetricDatum {
    /// Create a datum stamped with the current time
    pub fn new(metric_name: impl Into<String>, unit: MetricUnit, value: f64) -> Self {
        Self {
            metric_name: metric_name.into(),
            dimensions: Vec::new(),
            unit,
            value,
            timestamp: Utc::now(),
        }
    }

    /// Attach a dimension
    #[must_use]
    pub fn with_dimension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.push(MetricDimension::new(name, value));
        self
    }

    /// Look up a dimension value by name
    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.dimensions.iter().find(|d| d.name == name).map(|d| d.value.as_str())
    }
}
