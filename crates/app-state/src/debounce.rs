//! Debounced actions
//!
//! A [`Debouncer`] holds at most one pending action. Scheduling a new
//! action replaces the pending one and restarts the timer, so a burst of
//! triggers results in a single run after the burst goes quiet.

use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Boxed action run when a debounce timer fires
pub type DebouncedAction = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

struct Pending {
    generation: u64,
    action: DebouncedAction,
    timer: JoinHandle<()>,
}

struct Inner {
    scope: String,
    generation: AtomicU64,
    pending: Mutex<Option<Pending>>,
    // Held while an action runs so that flush waits for an in-flight run.
    running: tokio::sync::Mutex<()>,
}

/// Single-slot debounce scheduler
///
/// Dropping the debouncer does not cancel a pending action; it still
/// fires when its timer elapses.
pub struct Debouncer {
    inner: Arc<Inner>,
}

impl Debouncer {
    /// Create a debouncer for a named scope
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                scope: scope.into(),
                generation: AtomicU64::new(0),
                pending: Mutex::new(None),
                running: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Scope name used in logs
    pub fn scope(&self) -> &str {
        &self.inner.scope
    }

    /// Schedule `action` to run after `delay`, replacing any pending action
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F, Fut>(&self, delay: Duration, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let action: DebouncedAction = Box::new(move || Box::pin(action()));
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        // The slot stays locked until the new entry is in place, so the
        // timer can never look before it exists.
        let mut slot = self.inner.pending.lock();

        let inner = Arc::clone(&self.inner);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _running = inner.running.lock().await;

            let action = {
                let mut slot = inner.pending.lock();
                let current = slot.as_ref().is_some_and(|p| p.generation == generation);
                if current {
                    slot.take().map(|p| p.action)
                } else {
                    None
                }
            };

            if let Some(action) = action {
                tracing::trace!(scope = %inner.scope, "debounce timer fired");
                action().await;
            }
        });

        if let Some(previous) = slot.replace(Pending { generation, action, timer }) {
            // Still in the slot, so its timer has not started the action.
            previous.timer.abort();
            tracing::trace!(scope = %self.inner.scope, "debounce restarted");
        }
    }

    /// Whether an action is waiting for its timer
    pub fn is_pending(&self) -> bool {
        self.inner.pending.lock().is_some()
    }

    /// Drop the pending action without running it
    ///
    /// Returns whether an action was pending.
    pub fn cancel(&self) -> bool {
        match self.inner.pending.lock().take() {
            Some(pending) => {
                pending.timer.abort();
                true
            }
            None => false,
        }
    }

    /// Cancel the timer and run the pending action now
    ///
    /// If the timer already fired and its action is still running, waits
    /// for it to finish. Returns whether a pending action was run here.
    pub async fn flush(&self) -> bool {
        let _running = self.inner.running.lock().await;

        let pending = self.inner.pending.lock().take();
        match pending {
            Some(pending) => {
                pending.timer.abort();
                tracing::trace!(scope = %self.inner.scope, "debounce flushed");
                (pending.action)().await;
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("scope", &self.inner.scope)
            .field("pending", &self.is_pending())
            .finish()
    }
}
