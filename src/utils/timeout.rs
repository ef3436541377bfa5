//! Bounded waits for store calls.

use std::future::Future;
use std::time::Duration;

use serde_json::json;

use crate::error::AppError;

/// Runs `fut`, failing with a retryable [`AppError::Unavailable`] after `limit`.
pub async fn bounded<T, F>(limit: Duration, op: &'static str, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(op, timeout_ms = limit.as_millis() as u64, "Store call timed out");
            Err(AppError::unavailable(
                "Storage did not respond in time, try again",
                json!({ "operation": op }),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passes_through_result() {
        let out = bounded(Duration::from_secs(1), "noop", async { Ok::<_, AppError>(5) }).await;
        assert_eq!(out.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_times_out_as_unavailable() {
        let out: Result<(), AppError> = bounded(Duration::from_millis(10), "sleep", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        let err = out.unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(err, AppError::Unavailable { .. }));
    }
}
