//! Graceful shutdown for the site node.
//!
//! One [`ShutdownController`] fans a single stop signal out to the HTTP
//! server and the sweep task through a `tokio::sync::broadcast` channel.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::signal;
use tokio::sync::broadcast;

pub struct ShutdownController {
    tx: broadcast::Sender<()>,
    triggered: AtomicBool,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            triggered: AtomicBool::new(false),
        }
    }

    /// Get a receiver that will be notified on shutdown.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger shutdown. Later calls are no-ops.
    pub fn shutdown(&self) {
        if !self.triggered.swap(true, Ordering::SeqCst) {
            let _ = self.tx.send(());
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Wait for SIGINT or SIGTERM (or a programmatic trigger), then shut down.
    pub async fn wait_for_signal(&self) {
        let mut programmatic = self.subscribe();
        if self.is_triggered() {
            return;
        }

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "SIGTERM handler unavailable");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = signal::ctrl_c() => { tracing::info!("received SIGINT, shutting down"); }
            _ = terminate => { tracing::info!("received SIGTERM, shutting down"); }
            _ = programmatic.recv() => {}
        }

        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_subscriber_is_notified() {
        let controller = ShutdownController::new();
        let mut http = controller.subscribe();
        let mut sweep = controller.subscribe();
        controller.shutdown();
        assert!(http.recv().await.is_ok());
        assert!(sweep.recv().await.is_ok());
        assert!(controller.is_triggered());
    }

    #[tokio::test]
    async fn repeated_shutdown_sends_once() {
        let controller = ShutdownController::new();
        let mut rx = controller.subscribe();
        controller.shutdown();
        controller.shutdown();
        assert!(rx.recv().await.is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn wait_returns_after_programmatic_trigger() {
        let controller = std::sync::Arc::new(ShutdownController::new());
        let waiter = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.wait_for_signal().await })
        };
        tokio::task::yield_now().await;
        controller.shutdown();
        tokio::time::timeout(std::time::Duration::from_secs(5), waiter)
            .await
            .expect("waiter finished")
            .unwrap();
    }
}
