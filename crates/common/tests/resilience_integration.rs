//! Integration tests for resilience module
//!
//! Tests bounded worker pools and hard deadlines working together

#![cfg(feature = "runtime")]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use piiguard_common::resilience::{
    run_blocking_with_deadline, run_with_deadline, ResilienceError, WorkerPool, WorkerPoolConfig,
};

/// Custom error type for testing
#[derive(Debug, Clone)]
struct TestError {
    message: String,
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TestError {}

/// Validates that a pool never runs more operations than it has workers.
///
/// # Test Steps
/// 1. Create a pool with 3 workers
/// 2. Spawn 12 tasks that each sleep while holding a slot
/// 3. Verify all tasks complete
/// 4. Confirm the observed peak never exceeded 3
#[tokio::test(flavor = "multi_thread")]
async fn test_worker_pool_bounds_concurrency() {
    let pool = WorkerPool::new(WorkerPoolConfig::builder().name("classify").max_workers(3).build().unwrap())
        .unwrap();

    let handles: Vec<_> = (0..12u32)
        .map(|i| {
            let pool = pool.clone();
            tokio::spawn(async move {
                pool.execute(|| async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok::<_, TestError>(i)
                })
                .await
            })
        })
        .collect();

    let mut results: Vec<u32> =
        join_all(handles).await.into_iter().map(|joined| joined.unwrap().unwrap()).collect();
    results.sort_unstable();

    assert_eq!(results, (0..12).collect::<Vec<_>>());
    let metrics = pool.metrics();
    assert!(metrics.peak_in_flight <= 3, "peak was {}", metrics.peak_in_flight);
    assert_eq!(metrics.completed, 12);
    assert_eq!(metrics.in_flight, 0);
}

/// Validates that operation failures are counted and surfaced unchanged.
///
/// # Test Steps
/// 1. Run a mix of failing and succeeding operations through one pool
/// 2. Verify failures come back as `OperationFailed` with the original error
/// 3. Confirm completed and failed counters match
#[tokio::test]
async fn test_worker_pool_reports_failures() {
    let pool = WorkerPool::with_workers("detect", 2).unwrap();

    for i in 0..5u32 {
        let result = pool
            .execute(|| async move {
                if i % 2 == 0 {
                    Err(TestError { message: format!("failure {i}") })
                } else {
                    Ok(i)
                }
            })
            .await;

        match result {
            Ok(value) => assert_eq!(value % 2, 1),
            Err(ResilienceError::OperationFailed { source }) => {
                assert_eq!(source.message, format!("failure {i}"));
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    let metrics = pool.metrics();
    assert_eq!(metrics.completed, 2);
    assert_eq!(metrics.failed, 3);
}

#[test]
fn test_worker_pool_rejects_zero_workers() {
    assert!(WorkerPool::with_workers("empty", 0).is_err());
    assert!(WorkerPoolConfig::builder().name("empty").max_workers(0).build().is_err());
}

/// Validates that a deadline returns control while the worker keeps running.
///
/// # Test Steps
/// 1. Start a task that sleeps well past the budget, then sets a flag
/// 2. Verify the caller gets `Timeout` close to the budget
/// 3. Wait and confirm the abandoned task still finished
#[tokio::test(flavor = "multi_thread")]
async fn test_deadline_abandons_slow_task() {
    let finished = Arc::new(AtomicU32::new(0));
    let finished_clone = Arc::clone(&finished);

    let started = Instant::now();
    let result = run_with_deadline(Duration::from_millis(50), async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        finished_clone.fetch_add(1, Ordering::SeqCst);
        Ok::<_, TestError>(())
    })
    .await;

    assert!(matches!(result, Err(ResilienceError::Timeout { .. })));
    assert!(started.elapsed() < Duration::from_millis(190));

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(finished.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_deadline_passes_through_result_and_error() {
    let ok = run_with_deadline(Duration::from_secs(1), async { Ok::<_, TestError>(7) }).await;
    assert_eq!(tokio_test::assert_ok!(ok), 7);

    let err = run_with_deadline(Duration::from_secs(1), async {
        Err::<u32, _>(TestError { message: "boom".into() })
    })
    .await;
    match err {
        Err(ResilienceError::OperationFailed { source }) => assert_eq!(source.message, "boom"),
        other => panic!("expected OperationFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_deadline_reports_panicking_task_as_cancelled() {
    let result = run_with_deadline(Duration::from_secs(1), async {
        if std::hint::black_box(true) {
            panic!("worker exploded");
        }
        Ok::<u32, TestError>(0)
    })
    .await;

    assert!(matches!(result, Err(ResilienceError::Cancelled { .. })));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_blocking_deadline() {
    let fast = run_blocking_with_deadline(Duration::from_secs(1), || Ok::<_, TestError>("done")).await;
    tokio_test::assert_ok!(fast);

    let slow = run_blocking_with_deadline(Duration::from_millis(20), || {
        std::thread::sleep(Duration::from_millis(150));
        Ok::<_, TestError>("late")
    })
    .await;
    let error = tokio_test::assert_err!(slow);
    assert!(matches!(error, ResilienceError::Timeout { .. }));
}

/// Validates a pool of tasks each wrapped in a deadline, the way the
/// classification fan-out uses them.
///
/// # Test Steps
/// 1. Run 6 pooled operations inside one overall deadline
/// 2. Verify the whole batch completes in time with every result present
#[tokio::test(flavor = "multi_thread")]
async fn test_pooled_batch_under_deadline() {
    let pool = WorkerPool::with_workers("batch", 2).unwrap();

    let result = run_with_deadline(Duration::from_secs(2), async move {
        let mut handles = Vec::new();
        for i in 0..6u32 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                pool.execute(|| async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Ok::<_, TestError>(i * 2)
                })
                .await
            }));
        }

        let mut total = 0;
        for handle in handles {
            total += handle
                .await
                .map_err(|e| TestError { message: e.to_string() })?
                .map_err(|e| TestError { message: e.to_string() })?;
        }
        Ok::<_, TestError>(total)
    })
    .await;

    assert_eq!(result.unwrap(), 30);
}
