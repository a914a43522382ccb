//! Bounded worker pool for fan-out of independent operations
//!
//! A [`WorkerPool`] caps how many operations run concurrently. Callers spawn
//! one task per unit of work and every task runs its operation through
//! [`WorkerPool::execute`]; tasks beyond the cap queue on the pool's
//! semaphore in submission order. Nothing is rejected and nothing times out
//! here: deadlines are enforced by the caller.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

use super::ResilienceError;

/// Configuration for a worker pool
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Pool name used in logs and metrics
    pub name: String,
    /// Maximum number of operations running at once
    pub max_workers: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self { name: "default".to_string(), max_workers: 10 }
    }
}

impl WorkerPoolConfig {
    /// Create a new configuration builder
    pub fn builder() -> WorkerPoolConfigBuilder {
        WorkerPoolConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_workers == 0 {
            return Err(format!("worker pool '{}': max_workers must be greater than 0", self.name));
        }
        Ok(())
    }
}

/// Builder for [`WorkerPoolConfig`]
#[derive(Debug)]
pub struct WorkerPoolConfigBuilder {
    config: WorkerPoolConfig,
}

impl Default for WorkerPoolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerPoolConfigBuilder {
    /// Start from the default configuration
    pub fn new() -> Self {
        Self { config: WorkerPoolConfig::default() }
    }

    /// Set the pool name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the concurrency cap
    pub fn max_workers(mut self, max: usize) -> Self {
        self.config.max_workers = max;
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<WorkerPoolConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Snapshot of pool activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerPoolMetrics {
    /// Pool name
    pub name: String,
    /// Concurrency cap
    pub max_workers: usize,
    /// Operations currently holding a worker slot
    pub in_flight: usize,
    /// Highest number of simultaneously running operations observed
    pub peak_in_flight: usize,
    /// Operations that finished successfully
    pub completed: u64,
    /// Operations that returned an error
    pub failed: u64,
}

/// Semaphore-bounded worker pool
///
/// Cloning is cheap and clones share the same slots and counters, so one
/// clone can be moved into each spawned task.
///
/// # Examples
///
/// ```rust
/// use piiguard_common::resilience::{WorkerPool, WorkerPoolConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = WorkerPool::new(WorkerPoolConfig::builder().name("detect").max_workers(4).build()?)?;
///
/// let value = pool.execute(|| async { Ok::<_, std::io::Error>(42) }).await?;
/// assert_eq!(value, 42);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct WorkerPool {
    config: WorkerPoolConfig,
    semaphore: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
    completed: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
}

impl WorkerPool {
    /// Create a pool from a configuration
    ///
    /// # Errors
    /// Returns the validation message if the configuration is invalid.
    pub fn new(config: WorkerPoolConfig) -> Result<Self, String> {
        config.validate()?;

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(config.max_workers)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
            completed: Arc::new(AtomicU64::new(0)),
            failed: Arc::new(AtomicU64::new(0)),
            config,
        })
    }

    /// Shorthand for a named pool with `max_workers` slots
    ///
    /// # Errors
    /// Returns the validation message if `max_workers` is zero.
    pub fn with_workers(name: impl Into<String>, max_workers: usize) -> Result<Self, String> {
        Self::new(WorkerPoolConfig { name: name.into(), max_workers })
    }

    /// Pool name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Run an operation once a worker slot is free
    ///
    /// Waits without a timeout for a slot, runs the operation to completion
    /// and releases the slot when done (also on panic).
    #[instrument(skip(self, operation), fields(pool = %self.config.name))]
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, ResilienceError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let _permit = self.semaphore.acquire().await.map_err(|_| ResilienceError::Cancelled {
            message: format!("worker pool '{}' is closed", self.config.name),
        })?;

        let _slot = SlotGuard::enter(&self.in_flight, &self.peak_in_flight);
        debug!(in_flight = self.in_flight.load(Ordering::Acquire), "worker slot acquired");

        match operation().await {
            Ok(result) => {
                self.completed.fetch_add(1, Ordering::Relaxed);
                Ok(result)
            }
            Err(error) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                warn!(error = %error, "pooled operation failed");
                Err(ResilienceError::OperationFailed { source: error })
            }
        }
        // Slot and permit are released here when dropped
    }

    /// Get pool metrics
    pub fn metrics(&self) -> WorkerPoolMetrics {
        WorkerPoolMetrics {
            name: self.config.name.clone(),
            max_workers: self.config.max_workers,
            in_flight: self.in_flight.load(Ordering::Acquire),
            peak_in_flight: self.peak_in_flight.load(Ordering::Acquire),
            completed: self.completed.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
        }
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.config.name)
            .field("max_workers", &self.config.max_workers)
            .field("in_flight", &self.in_flight.load(Ordering::Acquire))
            .finish()
    }
}

/// Tracks one running operation for the in-flight and peak counters
struct SlotGuard<'a> {
    in_flight: &'a AtomicUsize,
}

impl<'a> SlotGuard<'a> {
    fn enter(in_flight: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        peak.fetch_max(now, Ordering::AcqRel);
        Self { in_flight }
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}
