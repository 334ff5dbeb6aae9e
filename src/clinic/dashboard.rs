//! The composed dashboard stats feed: three independent count subscriptions,
//! each updating one slice of a shared stats value and re-publishing a clone.
//! There is no cross-slice atomicity; a reader may transiently observe counts
//! taken at different moments. All three handles land in one
//! `SubscriptionSet` so a dashboard unmount releases them together.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::identity::Role;
use crate::store::{DocumentStore, QueryDescriptor, SharedStore, SubscriptionSet};

use super::{APPOINTMENTS_COLLECTION, PATIENTS_COLLECTION, USERS_COLLECTION};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub patients: usize,
    pub doctors: usize,
    pub appointments: usize,
}

pub type StatsCallback = Arc<dyn Fn(DashboardStats) + Send + Sync>;

pub fn subscribe_dashboard_stats(store: &SharedStore, on_stats: StatsCallback) -> SubscriptionSet {
    let set = SubscriptionSet::new();
    let stats = Arc::new(Mutex::new(DashboardStats::default()));

    let slice = Arc::clone(&stats);
    let publish = Arc::clone(&on_stats);
    set.push(store.subscribe(
        QueryDescriptor::collection(PATIENTS_COLLECTION),
        Arc::new(move |docs| {
            let current = {
                let mut stats = slice.lock();
                stats.patients = docs.len();
                *stats
            };
            publish(current);
        }),
    ));

    let slice = Arc::clone(&stats);
    let publish = Arc::clone(&on_stats);
    set.push(store.subscribe(
        QueryDescriptor::collection(USERS_COLLECTION).filter_eq("role", Role::Doctor.as_str()),
        Arc::new(move |docs| {
            let current = {
                let mut stats = slice.lock();
                stats.doctors = docs.len();
                *stats
            };
            publish(current);
        }),
    ));

    let slice = Arc::clone(&stats);
    let publish = Arc::clone(&on_stats);
    set.push(store.subscribe(
        QueryDescriptor::collection(APPOINTMENTS_COLLECTION),
        Arc::new(move |docs| {
            let current = {
                let mut stats = slice.lock();
                stats.appointments = docs.len();
                *stats
            };
            publish(current);
        }),
    ));

    set
}
