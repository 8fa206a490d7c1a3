//! Fire-and-forget dispatch of tracking events.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};

use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::tracking::sink::{TrackingEvent, TrackingSink};

/// Handle used on the request path. `emit` never waits on delivery.
#[derive(Clone)]
pub struct TrackingEmitter {
    tx: Option<mpsc::Sender<TrackingEvent>>,
}

impl TrackingEmitter {
    /// Start a worker that drains a bounded queue into `sink`.
    ///
    /// At most `max_in_flight` deliveries run at once. While they are all
    /// busy the worker stops draining, the queue fills, and further events
    /// are dropped.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        sink: Arc<dyn TrackingSink>,
        capacity: usize,
        max_in_flight: usize,
        timeout: Duration,
        shutdown: &Shutdown,
    ) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let permits = Arc::new(Semaphore::new(max_in_flight.max(1)));
        let shutdown_rx = shutdown.subscribe();
        tokio::spawn(run_worker(sink, rx, permits, timeout, shutdown_rx));
        Self { tx: Some(tx) }
    }

    /// An emitter that discards everything.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queue an event. Drops it when the queue is full or closed.
    ///
    /// Returns whether the event was queued.
    pub fn emit(&self, event: TrackingEvent) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        match tx.try_send(event) {
            Ok(()) => true,
            Err(e) => {
                let (reason, event) = match e {
                    mpsc::error::TrySendError::Full(ev) => ("queue_full", ev),
                    mpsc::error::TrySendError::Closed(ev) => ("queue_closed", ev),
                };
                tracing::warn!(path = %event.path(), kind = event.kind(), reason, "Dropping tracking event");
                metrics::record_tracking_event(reason);
                false
            }
        }
    }
}

async fn run_worker(
    sink: Arc<dyn TrackingSink>,
    mut rx: mpsc::Receiver<TrackingEvent>,
    permits: Arc<Semaphore>,
    timeout: Duration,
    mut shutdown_rx: tokio::sync::broadcast::Receiver<()>,
) {
    loop {
        // Take a delivery slot before pulling the next event off the queue.
        let permit = tokio::select! {
            permit = Arc::clone(&permits).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
            _ = shutdown_rx.recv() => break,
        };

        let event = tokio::select! {
            event = rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
            _ = shutdown_rx.recv() => break,
        };

        let sink = Arc::clone(&sink);
        tokio::spawn(async move {
            deliver(sink.as_ref(), &event, timeout).await;
            drop(permit);
        });
    }
    tracing::debug!("Tracking worker stopped");
}

async fn deliver(sink: &dyn TrackingSink, event: &TrackingEvent, timeout: Duration) {
    match tokio::time::timeout(timeout, sink.deliver(event)).await {
        Ok(Ok(())) => {
            tracing::debug!(path = %event.path(), kind = event.kind(), "Tracking event delivered");
            metrics::record_tracking_event("delivered");
        }
        Ok(Err(e)) => {
            tracing::warn!(path = %event.path(), kind = event.kind(), error = %e, "Failed to record visitor");
            metrics::record_tracking_event("failed");
        }
        Err(_) => {
            tracing::warn!(path = %event.path(), kind = event.kind(), timeout_ms = timeout.as_millis() as u64, "Tracking call timed out");
            metrics::record_tracking_event("timeout");
        }
    }
}
