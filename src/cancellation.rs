//! Cooperative cancellation handle passed through every async boundary.

use std::sync::Arc;

use tokio::sync::watch;

/// Cancellation signal shared between a caller and the work it started.
///
/// Cloning yields a handle to the same signal. Cancelling any clone is
/// observed by all of them.
#[derive(Clone, Debug)]
pub struct CancellationSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl CancellationSignal {
    /// Create a new, not yet cancelled, signal.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until cancellation is requested.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so `wait_for` cannot fail.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Whether both handles point to the same underlying signal.
    pub fn same_as(&self, other: &CancellationSignal) -> bool {
        Arc::ptr_eq(&self.tx, &other.tx)
    }

    /// Returns a guard which cancels this signal when dropped.
    pub fn drop_guard(&self) -> DropGuard {
        DropGuard {
            signal: self.clone(),
        }
    }
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancels its signal on drop.
#[derive(Debug)]
pub struct DropGuard {
    signal: CancellationSignal,
}

impl Drop for DropGuard {
    fn drop(&mut self) {
        self.signal.cancel();
    }
}
