//! The reactive session cell: `{identity, role, loading}` as one value, with
//! watcher callbacks for the layers above. The cell is an explicit handle
//! (`Arc<SessionCell>`) threaded to consumers rather than a process-wide
//! static, and only the role resolver writes it.
//!
//! Event superseding: the resolver stamps each auth event with an epoch from
//! `begin_event` and a resolution is applied only while its epoch is still the
//! latest. A slow stale lookup can never overwrite the outcome of a fresher
//! event, regardless of completion order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::store::SubscriptionHandle;

use super::authorizer::Role;
use super::principal::Identity;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub identity: Option<Identity>,
    pub role: Option<Role>,
    pub loading: bool,
}

impl SessionSnapshot {
    /// Process-start state: nothing conclusive may be rendered from it.
    pub fn initial() -> Self {
        Self { identity: None, role: None, loading: true }
    }

    pub fn anonymous() -> Self {
        Self { identity: None, role: None, loading: false }
    }

    pub fn authenticated(identity: Identity, role: Role) -> Self {
        Self { identity: Some(identity), role: Some(role), loading: false }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.loading && self.identity.is_some()
    }
}

pub type SessionWatcher = Arc<dyn Fn(&SessionSnapshot) + Send + Sync>;

struct Inner {
    state: SessionSnapshot,
    latest_epoch: u64,
}

pub struct SessionCell {
    inner: RwLock<Inner>,
    watchers: Arc<RwLock<HashMap<u64, SessionWatcher>>>,
    next_watcher_id: AtomicU64,
}

impl Default for SessionCell {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionCell {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner { state: SessionSnapshot::initial(), latest_epoch: 0 }),
            watchers: Arc::new(RwLock::new(HashMap::new())),
            next_watcher_id: AtomicU64::new(1),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.read().state.clone()
    }

    /// Register a watcher; it fires once immediately with the current snapshot
    /// and after every applied transition. Same cancellation contract as store
    /// subscriptions.
    pub fn watch(&self, watcher: SessionWatcher) -> SubscriptionHandle {
        let id = self.next_watcher_id.fetch_add(1, AtomicOrdering::SeqCst);
        {
            self.watchers.write().insert(id, watcher);
        }
        {
            let current = self.snapshot();
            let watchers = self.watchers.read();
            if let Some(watcher) = watchers.get(&id) {
                watcher(&current);
            }
        }
        let watchers = Arc::clone(&self.watchers);
        SubscriptionHandle::new(move || {
            watchers.write().remove(&id);
        })
    }

    /// Stamp a new auth event. Any resolution still in flight for an earlier
    /// epoch becomes stale from this point on.
    pub(crate) fn begin_event(&self) -> u64 {
        let mut inner = self.inner.write();
        inner.latest_epoch += 1;
        inner.latest_epoch
    }

    /// Apply a resolved snapshot if `epoch` is still the latest event. Returns
    /// whether the state was applied; stale resolutions are dropped untouched.
    pub(crate) fn apply_if_current(&self, epoch: u64, next: SessionSnapshot) -> bool {
        {
            let mut inner = self.inner.write();
            if inner.latest_epoch != epoch {
                return false;
            }
            inner.state = next.clone();
        }
        let watchers = self.watchers.read();
        for watcher in watchers.values() {
            watcher(&next);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn identity(uid: &str) -> Identity {
        Identity { uid: uid.into(), email: format!("{uid}@example.com"), display_name: None }
    }

    #[test]
    fn starts_loading_and_nothing_conclusive() {
        let cell = SessionCell::new();
        let snapshot = cell.snapshot();
        assert!(snapshot.loading);
        assert!(snapshot.identity.is_none());
        assert!(snapshot.role.is_none());
        assert!(!snapshot.is_authenticated());
    }

    #[test]
    fn stale_epoch_is_dropped() {
        let cell = SessionCell::new();
        let stale = cell.begin_event();
        let fresh = cell.begin_event();

        assert!(cell.apply_if_current(fresh, SessionSnapshot::anonymous()));
        assert!(!cell.apply_if_current(stale, SessionSnapshot::authenticated(identity("u1"), Role::Doctor)));

        let snapshot = cell.snapshot();
        assert_eq!(snapshot, SessionSnapshot::anonymous());
    }

    #[test]
    fn watchers_see_immediate_state_and_transitions() {
        let cell = SessionCell::new();
        let seen: Arc<Mutex<Vec<SessionSnapshot>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handle = cell.watch(Arc::new(move |s| sink.lock().push(s.clone())));

        let epoch = cell.begin_event();
        cell.apply_if_current(epoch, SessionSnapshot::authenticated(identity("u1"), Role::Admin));

        {
            let seen = seen.lock();
            assert_eq!(seen.len(), 2);
            assert!(seen[0].loading);
            assert_eq!(seen[1].role, Some(Role::Admin));
        }

        handle.unsubscribe();
        let epoch = cell.begin_event();
        cell.apply_if_current(epoch, SessionSnapshot::anonymous());
        assert_eq!(seen.lock().len(), 2);
    }
}
