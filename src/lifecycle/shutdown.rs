//! Shutdown coordination for the gate.

use std::future::Future;

use tokio::sync::broadcast;

/// Broadcast shutdown handle shared by the server, the limiter purge task
/// and the tracking worker.
///
/// Background tasks also stop when every clone is dropped, so keep one alive
/// for as long as the server runs.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver for use inside `tokio::select!` loops.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Future that resolves once shutdown is triggered.
    ///
    /// Subscribes when called, not when first polled, so a trigger that
    /// lands in between is not missed.
    pub fn signalled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            let _ = rx.recv().await;
        }
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
