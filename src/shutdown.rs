//! Cooperative shutdown handling
//!
//! A `Shutdown` handle combines a flag with a notifier so synchronous
//! checks and async waits both work. The websocket loop and fetch retry
//! delays race against it; nothing is hard-interrupted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::logger::{self, LogTag};

#[derive(Clone)]
pub struct Shutdown {
    inner: Arc<ShutdownInner>,
}

struct ShutdownInner {
    triggered: AtomicBool,
    notify: Notify,
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ShutdownInner {
                triggered: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Request shutdown. Idempotent; wakes every waiter.
    pub fn trigger(&self) {
        if !self.inner.triggered.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }

    /// Resolve once shutdown is triggered; immediately if it already was.
    pub async fn wait(&self) {
        loop {
            if self.is_triggered() {
                return;
            }
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register before re-checking the flag so a trigger landing
            // between the check and the await cannot be lost.
            notified.as_mut().enable();
            if self.is_triggered() {
                return;
            }
            notified.await;
        }
    }

    /// Sleep for `duration`, returning true early when shutdown fires first.
    pub async fn delay_or_shutdown(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => false,
            _ = self.wait() => true,
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Install Ctrl+C (and SIGTERM on Unix) handlers that trigger `shutdown`.
pub fn install_signal_handlers(shutdown: &Shutdown) -> anyhow::Result<()> {
    let handle = shutdown.clone();
    ctrlc::set_handler(move || {
        logger::info(LogTag::System, "Received Ctrl+C, shutting down...");
        handle.trigger();
    })?;

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let handle = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                    logger::info(LogTag::System, "Received SIGTERM, shutting down...");
                    handle.trigger();
                }
                Err(e) => {
                    logger::error(
                        LogTag::System,
                        &format!("Failed to install SIGTERM handler: {}", e),
                    );
                }
            }
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_resolves_after_trigger() {
        let shutdown = Shutdown::new();
        let waiter = shutdown.clone();
        let task = tokio::spawn(async move { waiter.wait().await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("wait did not resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn wait_resolves_immediately_when_already_triggered() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        tokio::time::timeout(Duration::from_millis(100), shutdown.wait())
            .await
            .expect("wait should resolve at once");
    }

    #[tokio::test]
    async fn delay_or_shutdown_completes_without_trigger() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.delay_or_shutdown(Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn delay_or_shutdown_returns_early_on_trigger() {
        let shutdown = Shutdown::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.trigger();
        });
        assert!(shutdown.delay_or_shutdown(Duration::from_secs(30)).await);
    }
}
