//! User operations: staff/doctor accounts in the `users` collection. Doctor
//! lookups validate the role here so appointment and booking writes cannot
//! reference a user that merely exists.

use std::sync::Arc;

use tracing::info;

use crate::error::{AppError, AppResult};
use crate::identity::Role;
use crate::store::{now_ms, Direction, DocumentStore, Fields, QueryDescriptor, SharedStore, SubscriptionHandle};

use super::models::{self, NewUser, Stored, UserRecord};
use super::USERS_COLLECTION;

pub type UsersCallback = Arc<dyn Fn(Vec<Stored<UserRecord>>) + Send + Sync>;

pub fn create_user(store: &SharedStore, new: NewUser) -> AppResult<String> {
    let record = UserRecord {
        name: new.name,
        email: new.email,
        role: new.role.as_str().to_string(),
        specialization: new.specialization,
        phone: new.phone,
        created_at: now_ms(),
    };
    let id = store.add(USERS_COLLECTION, models::to_fields(&record)?)?;
    info!(target: "carepulse::clinic", "user created id={} role={}", id, record.role);
    Ok(id)
}

pub fn update_user_role(store: &SharedStore, id: &str, role: Role) -> AppResult<()> {
    let mut patch = Fields::new();
    patch.insert("role".into(), role.as_str().into());
    patch.insert("updatedAt".into(), now_ms().into());
    store.update(USERS_COLLECTION, id, patch)?;
    Ok(())
}

pub fn delete_user(store: &SharedStore, id: &str) -> AppResult<()> {
    store.delete(USERS_COLLECTION, id)?;
    Ok(())
}

/// Live list of users, optionally narrowed to one role, ordered by name.
pub fn subscribe_users(store: &SharedStore, role: Option<Role>, on_change: UsersCallback) -> SubscriptionHandle {
    let mut descriptor = QueryDescriptor::collection(USERS_COLLECTION);
    if let Some(role) = role {
        descriptor = descriptor.filter_eq("role", role.as_str());
    }
    let descriptor = descriptor.order_by("name", Direction::Ascending);
    store.subscribe(descriptor, Arc::new(move |docs| on_change(models::decode_all(docs))))
}

pub fn subscribe_doctors(store: &SharedStore, on_change: UsersCallback) -> SubscriptionHandle {
    subscribe_users(store, Some(Role::Doctor), on_change)
}

pub fn get_doctor(store: &SharedStore, id: &str) -> AppResult<Stored<UserRecord>> {
    let doc = store
        .get(USERS_COLLECTION, id)?
        .ok_or_else(|| AppError::not_found("doctor_not_found", "Doctor not found"))?;
    models::from_document(doc)
}

/// Doctor reference check used by the write paths: the user must exist and
/// carry the doctor role, otherwise the operation reports the same typed
/// failure either way.
pub(crate) fn require_doctor(store: &SharedStore, id: &str) -> AppResult<Stored<UserRecord>> {
    const MSG: &str = "Doctor not found or invalid";
    let Some(doc) = store.get(USERS_COLLECTION, id)? else {
        return Err(AppError::not_found("doctor_invalid", MSG));
    };
    let user: Stored<UserRecord> = models::from_document(doc)?;
    if Role::parse(&user.record.role) != Some(Role::Doctor) {
        return Err(AppError::not_found("doctor_invalid", MSG));
    }
    Ok(user)
}

pub fn doctors_count(store: &SharedStore) -> AppResult<usize> {
    let descriptor = QueryDescriptor::collection(USERS_COLLECTION).filter_eq("role", Role::Doctor.as_str());
    Ok(store.count(&descriptor)?)
}
