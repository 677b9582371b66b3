//! # Cancellation
//!
//! Every call runs inside a [`CancelScope`] made of two signals:
//!
//! * the **call** token, supplied by the caller through [`crate::CallContext`], and
//! * the **shutdown** token, owned by the [`crate::GrpcWebClient`] that started the call.
//!
//! Whichever fires first aborts the pending read. Canceled calls end with a `Canceled` outcome,
//! never with an error.
use std::sync::Arc;
use tokio::sync::watch;

/// The triggering side of a cancellation signal. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Fires the signal. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// A token observing this handle.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: Some(self.tx.subscribe()),
        }
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// The observing side of a cancellation signal.
///
/// Dropping every [`CancelHandle`] without calling `cancel` leaves the token un-cancelled forever.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelToken {
    /// A token that never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once the signal fires. Never resolves for [`CancelToken::never`].
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };

        let mut rx = rx.clone();
        let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

/// Fires its handle when dropped. The client keeps one behind an `Arc` so the shutdown signal
/// fires when the last clone of the client goes away.
#[derive(Debug)]
pub(crate) struct ShutdownGuard(CancelHandle);

impl ShutdownGuard {
    pub(crate) fn new() -> Self {
        Self(CancelHandle::new())
    }

    pub(crate) fn handle(&self) -> &CancelHandle {
        &self.0
    }
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// The per-call combination of the caller's token and the client's shutdown token.
#[derive(Debug, Clone)]
pub struct CancelScope {
    call: CancelToken,
    shutdown: CancelToken,
}

impl CancelScope {
    pub fn new(call: CancelToken, shutdown: CancelToken) -> Self {
        Self { call, shutdown }
    }

    pub fn is_cancelled(&self) -> bool {
        self.call.is_cancelled() || self.shutdown.is_cancelled()
    }

    /// Resolves as soon as either signal fires.
    pub async fn cancelled(&self) {
        tokio::select! {
            _ = self.call.cancelled() => {}
            _ = self.shutdown.cancelled() => {}
        }
    }
}
