//! Observability infrastructure for logging and metrics
//!
//! - [`init_tracing`] installs the global `tracing` subscriber once
//! - [`BufferedMetricsSink`] collects datums during a request and publishes
//!   them in bounded batches on [`BufferedMetricsSink::flush`]
//!
//! ## Design Principles
//!
//! 1. **Poison Recovery**: a poisoned buffer lock is recovered with a
//!    `warn!` and the buffered datums are kept.
//!
//! 2. **Metrics never fail a request**: publish errors are logged at `error`
//!    and dropped.

pub mod metrics;

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

pub use metrics::{
    BufferedMetricsSink, DocumentMetrics, MetricsPublisher, TracingMetricsPublisher,
    MAX_METRIC_BATCH,
};

static INIT: Once = Once::new();

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins over `config.level`; an unparsable level falls back to
/// `info`. Output is plain text or one JSON object per line.
///
/// This function is idempotent; only the first call has an effect.
pub fn init_tracing(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let registry = tracing_subscriber::registry().with(filter);
        let installed = if config.json {
            registry.with(fmt::layer().json().with_target(true)).try_init()
        } else {
            registry.with(fmt::layer().with_target(true)).try_init()
        };

        if installed.is_err() {
            tracing::debug!("global tracing subscriber already installed");
        }
    });
}
