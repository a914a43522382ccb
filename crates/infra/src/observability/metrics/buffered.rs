//! In-memory metric buffer with batched publishing
//!
//! ## Design
//! - **Poison-safe locking** with explicit match pattern (no .expect())
//! - **MetricsResult returns** from `record` to satisfy the core port;
//!   recording currently always succeeds
//! - **Bounded batches** of at most [`MAX_METRIC_BATCH`] datums per publish

use std::sync::{Arc, Mutex, MutexGuard};

use piiguard_common::{MetricDatum, MetricsError, MetricsResult};
use piiguard_core::MetricsSink;
use tracing::{debug, error, info, warn};

/// Largest number of datums handed to a publisher at once
pub const MAX_METRIC_BATCH: usize = 15;

/// Namespace attached to every published batch
pub const METRICS_NAMESPACE: &str = "PiiGuard";

/// Destination for metric batches
pub trait MetricsPublisher: Send + Sync {
    /// Publish one batch of at most [`MAX_METRIC_BATCH`] datums
    fn publish(&self, namespace: &str, batch: &[MetricDatum]) -> MetricsResult<()>;
}

/// Publisher that writes each batch as a structured event on the
/// `piiguard::metrics` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetricsPublisher;

impl MetricsPublisher for TracingMetricsPublisher {
    fn publish(&self, namespace: &str, batch: &[MetricDatum]) -> MetricsResult<()> {
        let data =
            serde_json::to_string(batch).map_err(|e| MetricsError::Encoding(e.to_string()))?;
        info!(target: "piiguard::metrics", namespace, count = batch.len(), %data, "metric batch");
        Ok(())
    }
}

/// Metrics sink that buffers datums until [`flush`](Self::flush)
pub struct BufferedMetricsSink {
    buffer: Mutex<Vec<MetricDatum>>,
    publisher: Arc<dyn MetricsPublisher>,
    namespace: String,
}

impl std::fmt::Debug for BufferedMetricsSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferedMetricsSink")
            .field("pending", &self.pending())
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl Default for BufferedMetricsSink {
    fn default() -> Self {
        Self::new(Arc::new(TracingMetricsPublisher))
    }
}

impl BufferedMetricsSink {
    pub fn new(publisher: Arc<dyn MetricsPublisher>) -> Self {
        Self { buffer: Mutex::new(Vec::new()), publisher, namespace: METRICS_NAMESPACE.to_string() }
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Number of datums waiting to be published
    pub fn pending(&self) -> usize {
        self.lock_buffer().len()
    }

    /// Publish everything buffered so far
    ///
    /// The buffer is emptied even if publishing fails; failed batches are
    /// logged and dropped. Returns the number of datums published.
    pub fn flush(&self) -> usize {
        let data = std::mem::take(&mut *self.lock_buffer());
        if data.is_empty() {
            return 0;
        }

        let mut published = 0;
        for batch in data.chunks(MAX_METRIC_BATCH) {
            match self.publisher.publish(&self.namespace, batch) {
                Ok(()) => published += batch.len(),
                Err(e) => error!(error = %e, count = batch.len(), "Error publishing metrics"),
            }
        }

        debug!(published, total = data.len(), "flushed metrics");
        published
    }

    /// Drop everything buffered so far, returning how many datums were dropped
    pub fn clear(&self) -> usize {
        let mut buffer = self.lock_buffer();
        let dropped = buffer.len();
        buffer.clear();
        dropped
    }

    fn lock_buffer(&self) -> MutexGuard<'_, Vec<MetricDatum>> {
        match self.buffer.lock() {
            Ok(guard) => guard,
            Err(poison_err) => {
                warn!(
                    metric = "BufferedMetricsSink::buffer",
                    "Mutex poisoned during metric buffering, recovering data"
                );
                poison_err.into_inner()
            }
        }
    }
}

impl MetricsSink for BufferedMetricsSink {
    fn record(&self, datum: MetricDatum) -> MetricsResult<()> {
        self.lock_buffer().push(datum);
        Ok(())
    }
}
