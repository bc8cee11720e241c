//! Optional deadline for whole workflow steps.
//!
//! Individual HTTP calls are bounded by the provider client timeout; this
//! wraps a step (which may make several calls) in a single deadline.

use std::future::Future;
use std::time::Duration;

use crate::types::{AdrError, Result};

/// Run `future`, failing with [`AdrError::Timeout`] if it exceeds `timeout`.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(AdrError::timeout(operation_name, timeout)),
    }
}

/// Like [`with_timeout`] but only when a deadline is configured.
pub async fn with_optional_timeout<T, F>(
    timeout: Option<Duration>,
    future: F,
    operation_name: &str,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        Some(limit) => with_timeout(limit, future, operation_name).await,
        None => future.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Ok::<_, AdrError>(42) },
            "create_context",
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, AdrError>(42)
            },
            "generate_adrs",
        )
        .await;
        match result {
            Err(AdrError::Timeout { operation, .. }) => assert_eq!(operation, "generate_adrs"),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_deadline_runs_to_completion() {
        let result = with_optional_timeout(
            None,
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok::<_, AdrError>("done")
            },
            "compare",
        )
        .await;
        assert_eq!(result.unwrap(), "done");
    }
}
