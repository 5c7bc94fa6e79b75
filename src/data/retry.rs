use tokio_retry::{strategy::{ExponentialBackoff, jitter}, RetryIf};
use std::time::Duration;
use super::{DataError, DataResult};

/// Retry `operation` with jittered exponential backoff while the error is retryable
pub async fn retry_with_backoff<F, Fut, T>(
    operation: F,
    max_attempts: usize,
) -> DataResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = DataResult<T>>,
{
    let retry_strategy = ExponentialBackoff::from_millis(100)
        .max_delay(Duration::from_secs(10))
        .map(jitter)
        .take(max_attempts.saturating_sub(1));

    RetryIf::spawn(
        retry_strategy,
        || async {
            match operation().await {
                Ok(result) => Ok(result),
                Err(e) => {
                    match &e {
                        DataError::Network(_) => {
                            tracing::warn!("Retryable network error: {}", e);
                        }
                        DataError::RateLimit { retry_after } => {
                            tracing::warn!("Rate limited, retry after {} seconds", retry_after);
                            tokio::time::sleep(Duration::from_secs(*retry_after)).await;
                        }
                        _ if e.is_retryable() => {
                            tracing::warn!("Retryable provider error: {}", e);
                        }
                        _ => {
                            tracing::error!("Non-retryable error: {}", e);
                        }
                    }
                    Err(e)
                }
            }
        },
        |e: &DataError| e.is_retryable(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_non_retryable_error_fails_fast() {
        let calls = AtomicUsize::new(0);
        let result: DataResult<()> = retry_with_backoff(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(DataError::api_error(400u16, "Invalid API call"))
            },
            3,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_error_is_retried() {
        let calls = AtomicUsize::new(0);
        let result = retry_with_backoff(
            || async {
                let attempt = calls.fetch_add(1, Ordering::SeqCst);
                if attempt < 2 {
                    Err(DataError::api_error(503u16, "unavailable"))
                } else {
                    Ok(attempt)
                }
            },
            3,
        )
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
