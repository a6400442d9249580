use crate::error::RetryError;
use crate::policy::RetryConfig;
use std::future::Future;

/// すべてのエラーをリトライ対象として `operation` を繰り返す。
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, operation: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    with_retry_if(config, operation, |_| true).await
}

/// `is_retryable` が true を返すエラーに限り `operation` を繰り返す。
///
/// false を返したエラーは即座に `RetryError::NonRetryable` として返る。
pub async fn with_retry_if<F, Fut, T, E, P>(
    config: &RetryConfig,
    mut operation: F,
    is_retryable: P,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = config.effective_attempts();
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempt += 1;
                if !is_retryable(&e) {
                    return Err(RetryError::NonRetryable { attempt, error: e });
                }
                tracing::warn!("リトライ試行 {}/{}: {}", attempt, max_attempts, e);
                if attempt >= max_attempts {
                    return Err(RetryError::ExhaustedRetries {
                        attempts: max_attempts,
                        last_error: e,
                    });
                }
                tokio::time::sleep(config.compute_delay(attempt - 1)).await;
            }
        }
    }
}
