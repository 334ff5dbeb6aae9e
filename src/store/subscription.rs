//! Cancellation handles for live queries. Unsubscribing is idempotent, and a
//! `SubscriptionSet` lets a dashboard release everything it opened in one call
//! instead of tracking individual handles ad hoc.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Handle to one live subscription. Cloning shares the same cancellation
/// state; `unsubscribe` runs the underlying teardown exactly once.
#[derive(Clone)]
pub struct SubscriptionHandle {
    cancelled: Arc<AtomicBool>,
    cancel: Arc<dyn Fn() + Send + Sync>,
}

impl SubscriptionHandle {
    pub fn new(cancel: impl Fn() + Send + Sync + 'static) -> Self {
        Self { cancelled: Arc::new(AtomicBool::new(false)), cancel: Arc::new(cancel) }
    }

    /// Idempotent. After this returns, no further snapshot deliveries occur:
    /// backends remove the listener under the same lock that serializes
    /// dispatch, so an in-flight delivery completes before removal.
    pub fn unsubscribe(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            (self.cancel)();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Composite handle: a scoped set of subscriptions acquired together (one
/// dashboard mount) and released together. Dropping the set releases any
/// handle still inside, so a forgotten unmount cannot leak listeners.
#[derive(Default)]
pub struct SubscriptionSet {
    handles: Mutex<Vec<SubscriptionHandle>>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, handle: SubscriptionHandle) {
        self.handles.lock().push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.lock().is_empty()
    }

    pub fn release_all(&self) {
        for handle in self.handles.lock().drain(..) {
            handle.unsubscribe();
        }
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        self.release_all();
    }
}
