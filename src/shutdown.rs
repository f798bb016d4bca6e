//! Graceful shutdown handling for the prediction service.
//!
//! A [`ShutdownCoordinator`] is shared between the signal handler and the
//! HTTP server; the server stops accepting connections once shutdown is
//! initiated and drains in-flight requests.

use crate::error::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

/// Maximum time to wait for graceful shutdown before force exit.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Shutdown coordinator for managing graceful service termination.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    /// Watch channel for checking if shutdown is in progress.
    shutdown_watch: watch::Receiver<bool>,
    /// Internal sender for watch channel.
    shutdown_watch_tx: Arc<watch::Sender<bool>>,
    /// Flag indicating if shutdown has been initiated.
    is_shutting_down: Arc<AtomicBool>,
    /// Shutdown timeout.
    timeout: Duration,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_SHUTDOWN_TIMEOUT)
    }

    /// Create a new shutdown coordinator with custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let (shutdown_watch_tx, shutdown_watch) = watch::channel(false);

        Self {
            shutdown_watch,
            shutdown_watch_tx: Arc::new(shutdown_watch_tx),
            is_shutting_down: Arc::new(AtomicBool::new(false)),
            timeout,
        }
    }

    /// Check if shutdown is in progress.
    pub fn is_shutting_down(&self) -> bool {
        self.is_shutting_down.load(Ordering::SeqCst)
    }

    /// Initiate shutdown.
    pub fn shutdown(&self) {
        if self
            .is_shutting_down
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            info!("Initiating graceful shutdown");
            let _ = self.shutdown_watch_tx.send(true);
        }
    }

    /// Wait for shutdown signal.
    pub async fn wait_for_shutdown(&self) {
        let mut rx = self.shutdown_watch.clone();
        while !*rx.borrow() {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }

    /// Get shutdown timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Signal handler for graceful shutdown.
pub struct SignalHandler {
    coordinator: ShutdownCoordinator,
}

impl SignalHandler {
    /// Create a new signal handler.
    pub fn new(coordinator: ShutdownCoordinator) -> Self {
        Self { coordinator }
    }

    /// Install signal handlers and wait for one to fire.
    #[cfg(unix)]
    pub async fn run(self) -> Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigquit = signal(SignalKind::quit())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
            _ = sigquit.recv() => {
                info!("Received SIGQUIT");
            }
        }

        self.coordinator.shutdown();
        Ok(())
    }

    /// Install signal handlers (Windows version).
    #[cfg(windows)]
    pub async fn run(self) -> Result<()> {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
        self.coordinator.shutdown();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_coordinator_new() {
        let coordinator = ShutdownCoordinator::new();
        assert!(!coordinator.is_shutting_down());
        assert_eq!(coordinator.timeout(), DEFAULT_SHUTDOWN_TIMEOUT);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let coordinator = ShutdownCoordinator::with_timeout(Duration::from_secs(1));
        coordinator.shutdown();
        coordinator.shutdown();
        assert!(coordinator.is_shutting_down());
    }

    #[tokio::test]
    async fn test_wait_for_shutdown() {
        let coordinator = ShutdownCoordinator::new();
        let waiter = coordinator.clone();

        let handle = tokio::spawn(async move {
            waiter.wait_for_shutdown().await;
        });

        coordinator.shutdown();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter should finish")
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_after_shutdown_returns_immediately() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.shutdown();
        tokio::time::timeout(Duration::from_millis(100), coordinator.wait_for_shutdown())
            .await
            .expect("already shut down");
    }
}
