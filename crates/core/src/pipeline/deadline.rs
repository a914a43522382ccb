//! Pipeline deadline enforcement

use std::future::Future;
use std::time::Duration;

use piiguard_common::{run_with_deadline, ResilienceError};
use piiguard_domain::{PiiGuardError, Result};

/// Run `task` on its own worker and wait at most `budget` for it
///
/// On expiry the worker is abandoned, not cancelled, and
/// `PiiGuardError::DeadlineExceeded` is returned right away.
///
/// # Errors
/// `DeadlineExceeded` on expiry, the task's own error if it fails, or
/// `Internal` if the worker panics.
pub async fn within_deadline<F, T>(budget: Duration, task: F) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    run_with_deadline(budget, task).await.map_err(|error| match error {
        ResilienceError::Timeout { timeout } => PiiGuardError::DeadlineExceeded {
            budget_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        },
        ResilienceError::OperationFailed { source } => source,
        other => PiiGuardError::internal(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[tokio::test]
    async fn test_result_within_budget_is_returned() {
        let value = within_deadline(Duration::from_secs(1), async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_slow_task_exceeds_deadline_promptly() {
        let started = Instant::now();
        let result: Result<()> = within_deadline(Duration::from_millis(1000), async {
            tokio::time::sleep(Duration::from_millis(5000)).await;
            Ok(())
        })
        .await;

        let elapsed = started.elapsed();
        assert!(matches!(result, Err(PiiGuardError::DeadlineExceeded { budget_ms: 1000 })));
        assert!(elapsed >= Duration::from_millis(1000), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(1100), "{elapsed:?}");
    }

    #[tokio::test]
    async fn test_task_errors_pass_through() {
        let result: Result<()> =
            within_deadline(Duration::from_secs(1), async { Err(PiiGuardError::InvalidRequest("bad".into())) }).await;
        assert!(matches!(result, Err(PiiGuardError::InvalidRequest(_))));
    }
}
