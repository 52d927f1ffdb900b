use serde_json::Value;

use crate::error::ScraperError;
use crate::remote::RemoteScraper;
use crate::retry::{retry_fixed, RetryPolicy};

/// Reads the dataset of a finished run, riding out the remote store's
/// eventual consistency.
///
/// Another attempt is made after a [`ScraperError::NotReady`] answer, and after
/// an empty list, for as long as `policy` allows. Whatever the last allowed
/// attempt returns is accepted, including an empty list. Any other error ends
/// the fetch at once.
///
/// # Errors
///
/// Returns [`ScraperError::RemoteFatal`] when the dataset is still not ready
/// after the last attempt, or when the remote answers with a non-retryable
/// error.
pub async fn fetch_dataset<R>(
    remote: &R,
    remote_id: &str,
    policy: RetryPolicy,
) -> Result<Vec<Value>, ScraperError>
where
    R: RemoteScraper + ?Sized,
{
    let outcome = retry_fixed(
        policy,
        |attempt| async move {
            tracing::debug!(remote_id, attempt, "fetching dataset items");
            remote.get_dataset_items(remote_id).await
        },
        |result, attempt| match result {
            Err(e) if e.is_not_ready() => true,
            Ok(items) if items.is_empty() => {
                tracing::debug!(remote_id, attempt, "dataset came back empty; retrying");
                true
            }
            _ => false,
        },
    )
    .await;

    match outcome {
        Ok(items) => {
            tracing::debug!(remote_id, count = items.len(), "dataset fetched");
            Ok(items)
        }
        Err(ScraperError::NotReady { message, .. }) => Err(ScraperError::RemoteFatal {
            remote_id: remote_id.to_string(),
            message: format!(
                "dataset still not ready after {} attempts: {message}",
                policy.max_attempts.max(1)
            ),
        }),
        Err(e) => Err(ScraperError::RemoteFatal {
            remote_id: remote_id.to_string(),
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::testing::ScriptedScraper;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    fn not_ready() -> ScraperError {
        ScraperError::NotReady {
            remote_id: "run".to_string(),
            message: "HTTP 404".to_string(),
        }
    }

    #[tokio::test]
    async fn not_ready_twice_then_success_takes_three_calls() {
        let remote = ScriptedScraper::new();
        remote.push_dataset(Err(not_ready()));
        remote.push_dataset(Err(not_ready()));
        remote.push_dataset(Ok(vec![json!({"id": "1"})]));

        let items = fetch_dataset(&remote, "run", policy(3)).await.unwrap();

        assert_eq!(items, vec![json!({"id": "1"})]);
        assert_eq!(remote.dataset_calls(), 3);
    }

    #[tokio::test]
    async fn empty_result_is_retried_then_accepted_on_last_attempt() {
        let remote = ScriptedScraper::new();
        remote.push_dataset(Ok(vec![]));
        remote.push_dataset(Ok(vec![]));

        let items = fetch_dataset(&remote, "run", policy(2)).await.unwrap();

        assert!(items.is_empty());
        assert_eq!(remote.dataset_calls(), 2);
    }

    #[tokio::test]
    async fn empty_then_items_returns_items() {
        let remote = ScriptedScraper::new();
        remote.push_dataset(Ok(vec![]));
        remote.push_dataset(Ok(vec![json!({"id": "2"})]));

        let items = fetch_dataset(&remote, "run", policy(3)).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(remote.dataset_calls(), 2);
    }

    #[tokio::test]
    async fn exhausted_not_ready_becomes_fatal() {
        let remote = ScriptedScraper::new();
        for _ in 0..3 {
            remote.push_dataset(Err(not_ready()));
        }

        let err = fetch_dataset(&remote, "run", policy(3)).await.unwrap_err();

        assert!(matches!(err, ScraperError::RemoteFatal { .. }), "{err:?}");
        assert_eq!(remote.dataset_calls(), 3);
    }

    #[tokio::test]
    async fn hard_error_is_not_retried() {
        let remote = ScriptedScraper::new();
        remote.push_dataset(Err(ScraperError::Api {
            status: 500,
            message: "boom".to_string(),
        }));
        remote.push_dataset(Ok(vec![json!({"id": "never"})]));

        let err = fetch_dataset(&remote, "run", policy(3)).await.unwrap_err();

        assert!(matches!(err, ScraperError::RemoteFatal { .. }));
        assert_eq!(remote.dataset_calls(), 1);
    }
}
