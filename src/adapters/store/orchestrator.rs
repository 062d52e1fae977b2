//! Call orchestrator - connect-then-invoke with classified bounded retry.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::domain::billing::{error_envelope, ErrorCode};
use crate::ports::BillingError;

use super::connection::BillingSession;

/// Retry policy for retryable billing failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub attempts: u32,

    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Run one billing operation under the retry policy.
///
/// Ensures the session is connected before every attempt, then invokes the
/// operation. Failures are handled by disposition: canceled short-circuits
/// to the canceled envelope, retryable failures are re-attempted up to the
/// policy's cap with the fixed delay in between, anything else surfaces its
/// classified code immediately. Cancellation of the calling flow is raced
/// at every suspension point and treated like a user-canceled dialog.
///
/// The return value is always an envelope; no failure escapes as an error.
pub async fn orchestrate<F, Fut>(
    session: &BillingSession,
    cancel: &CancellationToken,
    policy: &RetryPolicy,
    op: F,
) -> Value
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Value, BillingError>>,
{
    let mut attempt: u32 = 0;
    loop {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("billing call canceled");
                return error_envelope(ErrorCode::BillingCanceled);
            }
            outcome = run_attempt(session, &op) => outcome,
        };

        match outcome {
            Ok(envelope) => {
                debug!(attempt, "billing call succeeded");
                return envelope;
            }
            Err(err) if err.is_canceled() => {
                warn!("billing canceled by user");
                return error_envelope(ErrorCode::BillingCanceled);
            }
            Err(err) if err.is_retryable() && attempt < policy.attempts => {
                attempt += 1;
                debug!(attempt, error = %err, "retrying billing call");
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        warn!("billing call canceled during retry delay");
                        return error_envelope(ErrorCode::BillingCanceled);
                    }
                    _ = tokio::time::sleep(policy.delay) => {}
                }
            }
            Err(err) => {
                error!(code = err.code().value(), error = %err, "billing call failed");
                return error_envelope(err.code());
            }
        }
    }
}

async fn run_attempt<F, Fut>(session: &BillingSession, op: &F) -> Result<Value, BillingError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Value, BillingError>>,
{
    session.connect().await?;
    op().await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use serde_json::json;

    use super::super::mock_store_client::MockStoreClient;
    use super::*;
    use crate::ports::StoreStatus;

    fn quick_policy() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            delay: Duration::from_millis(1),
        }
    }

    fn session() -> BillingSession {
        BillingSession::new(Arc::new(MockStoreClient::new()))
    }

    #[tokio::test]
    async fn success_returns_the_operation_envelope() {
        let calls = AtomicU32::new(0);
        let envelope = orchestrate(&session(), &CancellationToken::new(), &quick_policy(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(json!({ "responseCode": 0 })) }
        })
        .await;

        assert_eq!(envelope["responseCode"], 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retryable_failures_are_retried_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let envelope = orchestrate(&session(), &CancellationToken::new(), &quick_policy(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err(BillingError::store(StoreStatus::NetworkError.into()))
                } else {
                    Ok(json!({ "responseCode": 0 }))
                }
            }
        })
        .await;

        assert_eq!(envelope["responseCode"], 0);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_the_classified_code() {
        let calls = AtomicU32::new(0);
        let envelope = orchestrate(&session(), &CancellationToken::new(), &quick_policy(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(BillingError::store(StoreStatus::NetworkError.into())) }
        })
        .await;

        assert_eq!(envelope["responseCode"], 1306);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn fatal_failures_are_not_retried() {
        let calls = AtomicU32::new(0);
        let envelope = orchestrate(&session(), &CancellationToken::new(), &quick_policy(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(BillingError::store(StoreStatus::DeveloperError.into())) }
        })
        .await;

        assert_eq!(envelope["responseCode"], 1302);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn user_cancel_short_circuits_without_retry() {
        let envelope = orchestrate(&session(), &CancellationToken::new(), &quick_policy(), || {
            async { Err(BillingError::store(StoreStatus::UserCanceled.into())) }
        })
        .await;

        assert_eq!(envelope["responseCode"], 1300);
    }

    #[tokio::test]
    async fn canceled_token_wins_before_any_attempt() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let calls = AtomicU32::new(0);
        let envelope = orchestrate(&session(), &cancel, &quick_policy(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(json!({ "responseCode": 0 })) }
        })
        .await;

        assert_eq!(envelope["responseCode"], 1300);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancellation_during_retry_delay_yields_canceled() {
        let cancel = CancellationToken::new();
        let policy = RetryPolicy {
            attempts: 3,
            delay: Duration::from_secs(60),
        };

        let session = session();
        let envelope = {
            let cancel_after = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                cancel_after.cancel();
            });
            orchestrate(&session, &cancel, &policy, || async {
                Err(BillingError::store(StoreStatus::NetworkError.into()))
            })
            .await
        };

        assert_eq!(envelope["responseCode"], 1300);
    }
}
