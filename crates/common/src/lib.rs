//! Modular common utilities shared across PiiGuard crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: error classification, metric data types
//! - `runtime`: async infrastructure (bounded worker pools, deadlines)
//! - `observability`: optional tracing (pulled in by `runtime`)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;
#[cfg(feature = "foundation")]
pub mod observability;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use error::{ErrorClassification, ErrorSeverity};
#[cfg(feature = "foundation")]
pub use observability::{MetricDatum, MetricDimension, MetricUnit, MetricsError, MetricsResult};
#[cfg(feature = "runtime")]
pub use resilience::{
    run_blocking_with_deadline, run_with_deadline, ResilienceError, ResilienceResult, WorkerPool,
    WorkerPoolConfig, WorkerPoolConfigBuilder, WorkerPoolMetrics,
};
