//! In-memory document store. Collections are ordered maps guarded by a
//! read-write lock; live listeners sit in a registry keyed by a monotonically
//! increasing id. Snapshot dispatch holds the registry read lock while it
//! invokes callbacks, and unsubscribe removes the listener under the write
//! lock, so cancellation is serialized against in-flight deliveries: once
//! `unsubscribe()` returns, no callback runs again.
//!
//! Listener callbacks must not call `subscribe`/`unsubscribe` on the same
//! store reentrantly; the registry lock is not reentrant.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error};
use uuid::Uuid;

use super::query::{value_cmp, Direction, QueryDescriptor};
use super::subscription::SubscriptionHandle;
use super::{Document, DocumentStore, Fields, SharedStore, SnapshotCallback, StoreError};

struct Listener {
    descriptor: QueryDescriptor,
    on_snapshot: SnapshotCallback,
}

#[derive(Default)]
struct Registry {
    listeners: HashMap<u64, Listener>,
}

pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Fields>>>,
    registry: Arc<RwLock<Registry>>,
    next_listener_id: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            registry: Arc::new(RwLock::new(Registry::default())),
            next_listener_id: AtomicU64::new(1),
        }
    }

    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }

    fn evaluate(&self, descriptor: &QueryDescriptor) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read();
        let mut out: Vec<Document> = collections
            .get(&descriptor.collection)
            .map(|coll| {
                coll.iter()
                    .filter(|(_, fields)| descriptor.matches(fields))
                    .map(|(id, fields)| Document { id: id.clone(), fields: fields.clone() })
                    .collect()
            })
            .unwrap_or_default();
        drop(collections);
        if let Some(ordering) = &descriptor.ordering {
            out.sort_by(|a, b| {
                let cmp = value_cmp(a.fields.get(&ordering.field), b.fields.get(&ordering.field));
                match ordering.direction {
                    Direction::Ascending => cmp,
                    Direction::Descending => cmp.reverse(),
                }
            });
        }
        if let Some(limit) = descriptor.limit {
            out.truncate(limit);
        }
        Ok(out)
    }

    /// Re-evaluate and deliver to every listener watching `collection`. A
    /// failed evaluation is logged and skipped; the listener keeps its last
    /// good snapshot (no retry, per the subscription failure contract).
    fn notify(&self, collection: &str) {
        let registry = self.registry.read();
        for listener in registry.listeners.values() {
            if listener.descriptor.collection != collection {
                continue;
            }
            match self.evaluate(&listener.descriptor) {
                Ok(snapshot) => (listener.on_snapshot)(&snapshot),
                Err(err) => {
                    error!(
                        target: "carepulse::store",
                        "subscription on '{}' failed to re-evaluate: {err}; keeping last snapshot",
                        collection
                    );
                }
            }
        }
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read();
        Ok(collections
            .get(collection)
            .and_then(|coll| coll.get(id))
            .map(|fields| Document { id: id.to_string(), fields: fields.clone() }))
    }

    fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        {
            let mut collections = self.collections.write();
            collections.entry(collection.to_string()).or_default().insert(id.clone(), fields);
        }
        debug!(target: "carepulse::store", "add {}/{}", collection, id);
        self.notify(collection);
        Ok(id)
    }

    fn put_new(&self, collection: &str, id: &str, fields: Fields) -> Result<bool, StoreError> {
        {
            let mut collections = self.collections.write();
            let coll = collections.entry(collection.to_string()).or_default();
            if coll.contains_key(id) {
                return Ok(false);
            }
            coll.insert(id.to_string(), fields);
        }
        debug!(target: "carepulse::store", "put_new {}/{}", collection, id);
        self.notify(collection);
        Ok(true)
    }

    fn update(&self, collection: &str, id: &str, patch: Fields) -> Result<(), StoreError> {
        {
            let mut collections = self.collections.write();
            let fields = collections
                .get_mut(collection)
                .and_then(|coll| coll.get_mut(id))
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
            for (key, value) in patch {
                fields.insert(key, value);
            }
        }
        self.notify(collection);
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let removed = {
            let mut collections = self.collections.write();
            collections.get_mut(collection).and_then(|coll| coll.remove(id)).is_some()
        };
        if removed {
            debug!(target: "carepulse::store", "delete {}/{}", collection, id);
            self.notify(collection);
        }
        Ok(())
    }

    fn query(&self, descriptor: &QueryDescriptor) -> Result<Vec<Document>, StoreError> {
        self.evaluate(descriptor)
    }

    fn subscribe(&self, descriptor: QueryDescriptor, on_snapshot: SnapshotCallback) -> SubscriptionHandle {
        let id = self.next_listener_id.fetch_add(1, AtomicOrdering::SeqCst);
        {
            let mut registry = self.registry.write();
            registry.listeners.insert(id, Listener { descriptor, on_snapshot });
        }
        // Initial delivery, under the read lock so an unsubscribe racing the
        // first snapshot still blocks until it has been handed out.
        {
            let registry = self.registry.read();
            if let Some(listener) = registry.listeners.get(&id) {
                match self.evaluate(&listener.descriptor) {
                    Ok(snapshot) => (listener.on_snapshot)(&snapshot),
                    Err(err) => error!(
                        target: "carepulse::store",
                        "initial snapshot for listener {id} failed: {err}"
                    ),
                }
            }
        }
        let registry = Arc::clone(&self.registry);
        SubscriptionHandle::new(move || {
            registry.write().listeners.remove(&id);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn add_get_update_delete() {
        let store = MemoryStore::new();
        let id = store.add("patients", fields(json!({"name": "Ali Raza", "phone": "111"}))).unwrap();
        let doc = store.get("patients", &id).unwrap().unwrap();
        assert_eq!(doc.str_field("name"), Some("Ali Raza"));

        store.update("patients", &id, fields(json!({"phone": "222"}))).unwrap();
        let doc = store.get("patients", &id).unwrap().unwrap();
        assert_eq!(doc.str_field("phone"), Some("222"));
        assert_eq!(doc.str_field("name"), Some("Ali Raza"));

        store.delete("patients", &id).unwrap();
        assert!(store.get("patients", &id).unwrap().is_none());
        // idempotent
        store.delete("patients", &id).unwrap();
    }

    #[test]
    fn update_missing_document_is_not_found() {
        let store = MemoryStore::new();
        let err = store.update("patients", "ghost", fields(json!({"phone": "x"}))).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn put_new_is_create_if_absent() {
        let store = MemoryStore::new();
        assert!(store.put_new("users", "u1", fields(json!({"role": "doctor"}))).unwrap());
        assert!(!store.put_new("users", "u1", fields(json!({"role": "admin"}))).unwrap());
        let doc = store.get("users", "u1").unwrap().unwrap();
        assert_eq!(doc.str_field("role"), Some("doctor"));
    }

    #[test]
    fn query_filters_orders_and_limits() {
        let store = MemoryStore::new();
        store.put_new("appointments", "a", fields(json!({"date": "d1", "time": "10:00"}))).unwrap();
        store.put_new("appointments", "b", fields(json!({"date": "d1", "time": "08:30"}))).unwrap();
        store.put_new("appointments", "c", fields(json!({"date": "d2", "time": "09:00"}))).unwrap();

        let q = QueryDescriptor::collection("appointments")
            .filter_eq("date", "d1")
            .order_by("time", Direction::Ascending);
        let out = store.query(&q).unwrap();
        assert_eq!(out.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(), vec!["b", "a"]);

        let out = store.query(&q.clone().limit(1)).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "b");

        assert_eq!(store.count(&QueryDescriptor::collection("appointments")).unwrap(), 3);
    }

    #[test]
    fn subscribe_fires_immediately_and_on_each_change() {
        let store = MemoryStore::new();
        let seen: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handle = store.subscribe(
            QueryDescriptor::collection("patients"),
            Arc::new(move |docs| sink.lock().push(docs.len())),
        );
        store.add("patients", fields(json!({"name": "x"}))).unwrap();
        store.add("patients", fields(json!({"name": "y"}))).unwrap();
        assert_eq!(*seen.lock(), vec![0, 1, 2]);

        handle.unsubscribe();
        store.add("patients", fields(json!({"name": "z"}))).unwrap();
        assert_eq!(*seen.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn mutations_in_other_collections_do_not_fan_out() {
        let store = MemoryStore::new();
        let seen: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _handle = store.subscribe(
            QueryDescriptor::collection("patients"),
            Arc::new(move |docs| sink.lock().push(docs.len())),
        );
        store.add("appointments", fields(json!({"date": "d"}))).unwrap();
        assert_eq!(*seen.lock(), vec![0]);
    }
}
