//! Retry with exponential back-off and jitter for order submission.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries
//! on transient errors (network failures, timeouts, 5xx). Validation
//! rejections and conflicts are returned immediately; resubmitting the
//! same bad payload cannot succeed.

use std::future::Future;
use std::time::Duration;

use crate::error::CheckoutError;

/// Returns `true` for errors that are worth retrying after a back-off
/// delay: timeouts, connection failures, and HTTP 5xx responses.
pub(crate) fn is_retriable(err: &CheckoutError) -> bool {
    match err {
        CheckoutError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        CheckoutError::Api { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors. Delay doubles per attempt from `backoff_base_ms`,
/// with ±25 % jitter, capped at 30 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, CheckoutError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CheckoutError>>,
{
    const MAX_DELAY_MS: u64 = 30_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient order API error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn rejection() -> CheckoutError {
        CheckoutError::Api {
            status: 400,
            message: "Cart items missing".to_owned(),
        }
    }

    #[test]
    fn validation_rejection_is_not_retriable() {
        assert!(!is_retriable(&rejection()));
    }

    #[test]
    fn conflict_is_not_retriable() {
        assert!(!is_retriable(&CheckoutError::Api {
            status: 409,
            message: "already exists".to_owned(),
        }));
    }

    #[test]
    fn server_error_is_retriable() {
        assert!(is_retriable(&CheckoutError::Api {
            status: 503,
            message: "unavailable".to_owned(),
        }));
    }

    #[test]
    fn empty_cart_is_not_retriable() {
        assert!(!is_retriable(&CheckoutError::EmptyCart));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, CheckoutError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn does_not_retry_validation_rejection() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(rejection())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(CheckoutError::Api { status: 400, .. })));
    }

    #[tokio::test]
    async fn retries_transient_errors_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err::<u32, _>(CheckoutError::Api {
                        status: 502,
                        message: "bad gateway".to_owned(),
                    })
                } else {
                    Ok(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_retries_and_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(CheckoutError::Api {
                    status: 500,
                    message: "boom".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3, "1 try + 2 retries");
        assert!(matches!(result, Err(CheckoutError::Api { status: 500, .. })));
    }
}
