//! Hard wall-clock deadlines over detached workers
//!
//! The work is moved onto its own task (or blocking thread) and the caller
//! waits at most `budget` for it. On expiry the join handle is dropped, which
//! detaches the worker: it keeps running until it finishes on its own, but
//! the caller regains control immediately.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{ResilienceError, ResilienceResult};

/// Run an async task with a hard deadline
///
/// # Errors
/// - [`ResilienceError::Timeout`] if `budget` elapses first. The task is
///   abandoned, not cancelled.
/// - [`ResilienceError::OperationFailed`] if the task returns an error.
/// - [`ResilienceError::Cancelled`] if the task panics.
pub async fn run_with_deadline<F, T, E>(budget: Duration, task: F) -> ResilienceResult<T, E>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    await_with_deadline(budget, tokio::spawn(task)).await
}

/// Run a blocking closure on the blocking thread pool with a hard deadline
///
/// Same contract as [`run_with_deadline`]. An abandoned closure keeps its
/// thread until it returns.
///
/// # Errors
/// See [`run_with_deadline`].
pub async fn run_blocking_with_deadline<F, T, E>(
    budget: Duration,
    task: F,
) -> ResilienceResult<T, E>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    await_with_deadline(budget, tokio::task::spawn_blocking(task)).await
}

async fn await_with_deadline<T, E>(
    budget: Duration,
    handle: JoinHandle<Result<T, E>>,
) -> ResilienceResult<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    let started = Instant::now();

    match tokio::time::timeout(budget, handle).await {
        Ok(Ok(Ok(value))) => {
            debug!(elapsed_ms = started.elapsed().as_millis(), "task finished within deadline");
            Ok(value)
        }
        Ok(Ok(Err(error))) => Err(ResilienceError::OperationFailed { source: error }),
        Ok(Err(join_error)) => Err(ResilienceError::Cancelled { message: join_error.to_string() }),
        Err(_) => {
            warn!(budget_ms = budget.as_millis(), "deadline expired, abandoning worker");
            Err(ResilienceError::Timeout { timeout: budget })
        }
    }
}
