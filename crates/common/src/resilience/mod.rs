//! Resilience patterns for bounded concurrency and hard deadlines
//!
//! - **Worker pool**: a named, semaphore-bounded pool that caps how many
//!   operations run at once while letting callers spawn one task per unit of
//!   work.
//! - **Deadline**: runs a unit of work on a detached worker and stops waiting
//!   once a wall-clock budget is spent. The worker is abandoned, never
//!   cancelled.
//!
//! Both are generic over the operation's error type and report failures
//! through [`ResilienceError`], which callers map into their own error enums.

use std::time::Duration;

use thiserror::Error;

pub mod deadline;
pub mod worker_pool;

pub use deadline::{run_blocking_with_deadline, run_with_deadline};
pub use worker_pool::{WorkerPool, WorkerPoolConfig, WorkerPoolConfigBuilder, WorkerPoolMetrics};

/// Errors produced by resilience wrappers
///
/// Generic over the underlying operation error `E` so the original failure is
/// preserved as the error source.
#[derive(Debug, Error)]
pub enum ResilienceError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// The deadline elapsed before the operation finished
    #[error("Operation timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// The worker running the operation stopped without a result (panic or
    /// runtime shutdown)
    #[error("Worker stopped before producing a result: {message}")]
    Cancelled { message: String },

    /// The underlying operation failed
    #[error("Operation failed: {source}")]
    OperationFailed {
        #[source]
        source: E,
    },

    /// Configuration error
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Result type for resilience operations
pub type ResilienceResult<T, E> = Result<T, ResilienceError<E>>;

impl<E> ResilienceError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Unwrap the operation error, if this is an `OperationFailed`
    pub fn into_operation_error(self) -> Result<E, Self> {
        match self {
            Self::OperationFailed { source } => Ok(source),
            other => Err(other),
        }
    }
}
