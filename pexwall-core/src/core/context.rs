use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::core::error::{GatewayError, GatewayResult};

/// Caller-owned cancellation switch, e.g. tripped when a screen is left.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `cancel` has been called (immediately if it already was).
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            // We hold the sender, so this cannot close; never resolve if it does.
            std::future::pending::<()>().await;
        }
    }
}

/// Per-call options travelling with a gateway request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: Option<CancelHandle>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map_or(false, CancelHandle::is_cancelled)
    }

    /// Drive `work` unless the caller cancels first.
    pub async fn run<T, F>(&self, work: F) -> GatewayResult<T>
    where
        F: Future<Output = GatewayResult<T>>,
    {
        match &self.cancel {
            None => work.await,
            Some(cancel) => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(GatewayError::Cancelled),
                    result = work => result,
                }
            }
        }
    }
}

/// Bound an upstream call, turning an elapsed deadline into a typed error.
pub async fn with_timeout<T, F>(limit: Duration, work: F) -> GatewayResult<T>
where
    F: Future<Output = GatewayResult<T>>,
{
    tokio::time::timeout(limit, work)
        .await
        .map_err(|_| GatewayError::Timeout(limit))?
}
