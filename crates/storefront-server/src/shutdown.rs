//! Graceful shutdown.
//!
//! A [`ShutdownSignal`] stops the accept loop; a [`ConnectionTracker`]
//! lets the server wait for connections that were already accepted.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Notify};

/// Cloneable one-shot stop flag.
///
/// ```
/// use storefront_server::ShutdownSignal;
///
/// let signal = ShutdownSignal::new();
/// let observer = signal.clone();
/// signal.trigger();
/// assert!(observer.is_triggered());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Creates a signal triggered by SIGTERM or Ctrl-C.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn from_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();
        tokio::spawn(async move {
            wait_for_os_signal().await;
            trigger.trigger();
        });
        signal
    }

    /// Triggers the signal. Later calls do nothing.
    pub fn trigger(&self) {
        self.sender.send_if_modified(|stopped| !std::mem::replace(stopped, true));
    }

    /// Returns true once triggered.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    /// Completes once the signal is triggered, immediately if it already was.
    pub async fn wait(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = receiver.wait_for(|stopped| *stopped).await;
    }
}

async fn wait_for_os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
                    _ = tokio::signal::ctrl_c() => tracing::info!("received Ctrl-C, shutting down"),
                }
                return;
            }
            Err(err) => {
                tracing::warn!(error = %err, "cannot listen for SIGTERM, only Ctrl-C will stop the server");
            }
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received Ctrl-C, shutting down"),
        Err(err) => tracing::error!(error = %err, "cannot listen for Ctrl-C"),
    }
}

/// Counts open connections.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    inner: Arc<TrackerInner>,
}

#[derive(Debug, Default)]
struct TrackerInner {
    active: AtomicUsize,
    drained: Notify,
}

impl ConnectionTracker {
    /// Creates a tracker with no connections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection until the returned guard drops.
    #[must_use]
    pub fn track(&self) -> ConnectionGuard {
        self.inner.active.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Returns the number of open connections.
    #[must_use]
    pub fn active(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Completes when no connection is open.
    pub async fn drained(&self) {
        loop {
            let notified = self.inner.drained.notified();
            if self.active() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Keeps one connection counted.
#[derive(Debug)]
pub struct ConnectionGuard {
    inner: Arc<TrackerInner>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if self.inner.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.drained.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_trigger_is_idempotent() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_triggered());
        signal.trigger();
        signal.trigger();
        assert!(signal.is_triggered());
    }

    #[tokio::test]
    async fn test_wait_after_trigger_returns() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        tokio::time::timeout(Duration::from_millis(50), signal.wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_wakes_on_trigger() {
        let signal = ShutdownSignal::new();
        let trigger = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.trigger();
        });
        tokio::time::timeout(Duration::from_secs(1), signal.wait())
            .await
            .unwrap();
    }

    #[test]
    fn test_tracker_counts_guards() {
        let tracker = ConnectionTracker::new();
        let first = tracker.track();
        let second = tracker.track();
        assert_eq!(tracker.active(), 2);
        drop(first);
        assert_eq!(tracker.active(), 1);
        drop(second);
        assert_eq!(tracker.active(), 0);
    }

    #[tokio::test]
    async fn test_drained_waits_for_last_guard() {
        let tracker = ConnectionTracker::new();
        tokio::time::timeout(Duration::from_millis(50), tracker.drained())
            .await
            .unwrap();

        let guard = tracker.track();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            drop(guard);
        });
        tokio::time::timeout(Duration::from_secs(1), tracker.drained())
            .await
            .unwrap();
    }
}
