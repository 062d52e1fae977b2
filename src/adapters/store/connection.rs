//! Billing session - connection lifecycle over the vendor client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, error, warn};

use crate::ports::{BillingError, ConnectionListener, StoreBillingClient, StoreResponse};

use super::pending::{PendingResult, Resolver};

/// A scoped connection to the store billing service.
///
/// One session backs one orchestrated call sequence: the connection is
/// established lazily on first use, reused across the retry attempts of
/// that call, and torn down exactly once when the call scope exits.
pub struct BillingSession {
    client: Arc<dyn StoreBillingClient>,
    closed: AtomicBool,
}

impl BillingSession {
    pub fn new(client: Arc<dyn StoreBillingClient>) -> Self {
        Self {
            client,
            closed: AtomicBool::new(false),
        }
    }

    /// Ensure a ready connection.
    ///
    /// Returns immediately when the client is already ready; no duplicate
    /// connection attempt is made. Otherwise suspends until the vendor's
    /// setup callback fires and maps a failed setup to its classified
    /// error. A later disconnect notification is logged but does not fail
    /// in-flight work; the next call re-detects readiness here.
    pub async fn connect(&self) -> Result<(), BillingError> {
        if self.client.is_ready() {
            return Ok(());
        }

        debug!("connecting to the store billing service");
        let (resolver, pending) = PendingResult::channel();
        self.client
            .start_connection(Box::new(SetupListener::new(resolver)));
        pending.wait().await
    }

    /// Tear the connection down. Idempotent; safe when never connected.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("closing store billing connection");
            self.client.end_connection();
        }
    }
}

impl Drop for BillingSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Bridges the vendor's connection lifecycle callbacks onto a
/// [`PendingResult`].
struct SetupListener {
    resolver: Mutex<Option<Resolver<()>>>,
}

impl SetupListener {
    fn new(resolver: Resolver<()>) -> Self {
        Self {
            resolver: Mutex::new(Some(resolver)),
        }
    }
}

impl ConnectionListener for SetupListener {
    fn on_setup_finished(&self, response: StoreResponse) {
        let resolver = self.resolver.lock().ok().and_then(|mut slot| slot.take());
        let Some(resolver) = resolver else {
            return;
        };

        if response.is_ok() {
            debug!("billing setup finished");
            resolver.resolve(Ok(()));
        } else {
            error!(
                status = ?response.status,
                message = %response.message,
                "billing setup failed"
            );
            resolver.resolve(Err(BillingError::store(response)));
        }
    }

    fn on_disconnected(&self) {
        warn!("store billing service disconnected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::ErrorCode;
    use crate::ports::StoreStatus;

    use super::super::mock_store_client::MockStoreClient;

    fn session() -> (Arc<MockStoreClient>, BillingSession) {
        let client = Arc::new(MockStoreClient::new());
        let session = BillingSession::new(client.clone());
        (client, session)
    }

    #[tokio::test]
    async fn connect_is_idempotent_once_ready() {
        let (client, session) = session();

        session.connect().await.unwrap();
        session.connect().await.unwrap();

        assert_eq!(client.connection_attempts(), 1);
    }

    #[tokio::test]
    async fn failed_setup_maps_to_classified_error() {
        let (client, session) = session();
        client.script_connection(&[StoreStatus::BillingUnavailable]);

        let err = session.connect().await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::BillingUnavailable);
    }

    #[tokio::test]
    async fn failed_setup_then_success_reconnects() {
        let (client, session) = session();
        client.script_connection(&[StoreStatus::ServiceUnavailable]);

        assert!(session.connect().await.is_err());
        session.connect().await.unwrap();
        assert_eq!(client.connection_attempts(), 2);
    }

    #[tokio::test]
    async fn close_tears_down_exactly_once() {
        let (client, session) = session();
        session.connect().await.unwrap();

        session.close();
        session.close();
        drop(session);

        assert_eq!(client.end_connection_calls(), 1);
    }

    #[tokio::test]
    async fn drop_closes_an_unclosed_session() {
        let (client, session) = session();
        session.connect().await.unwrap();

        drop(session);

        assert_eq!(client.end_connection_calls(), 1);
    }

    #[tokio::test]
    async fn disconnect_notification_does_not_fail_connect() {
        let (client, session) = session();
        session.connect().await.unwrap();

        client.notify_disconnected();

        // Readiness is re-detected on the next connect.
        session.connect().await.unwrap();
    }
}
