//! Single-assignment futures bridging vendor callbacks.

use tokio::sync::oneshot;

use crate::ports::BillingError;

/// Receiving half of a single-assignment result.
///
/// Bridges a callback-style vendor API into sequential flow: the caller
/// hands the [`Resolver`] to the callback and awaits [`PendingResult::wait`].
/// Completion happens at most once; the resolver is consumed by resolving,
/// so a second completion is unrepresentable.
pub struct PendingResult<T> {
    rx: oneshot::Receiver<Result<T, BillingError>>,
}

/// Completing half of a [`PendingResult`].
pub struct Resolver<T> {
    tx: oneshot::Sender<Result<T, BillingError>>,
}

impl<T> PendingResult<T> {
    /// Create a linked resolver/pending pair.
    pub fn channel() -> (Resolver<T>, PendingResult<T>) {
        let (tx, rx) = oneshot::channel();
        (Resolver { tx }, PendingResult { rx })
    }

    /// Suspend until the resolver completes.
    ///
    /// A resolver dropped without resolving means the vendor never invoked
    /// its callback; that surfaces as a fatal billing error rather than a
    /// hang.
    pub async fn wait(self) -> Result<T, BillingError> {
        self.rx
            .await
            .unwrap_or_else(|_| Err(BillingError::rejected("billing service dropped the callback")))
    }
}

impl<T> Resolver<T> {
    /// Complete the pending result.
    pub fn resolve(self, result: Result<T, BillingError>) {
        // The receiver may already be gone when the calling flow was
        // canceled; nothing to do then.
        let _ = self.tx.send(result);
    }
}
