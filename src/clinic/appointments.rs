//! Appointment operations. Creation validates both referenced records up
//! front and denormalizes names, phone and specialization into the written
//! document. The read-read-write sequence is not transactional: a referenced
//! record deleted in between leaves a dangling id with snapshot fields, which
//! is the documented behavior.

use std::sync::Arc;

use tracing::info;

use crate::error::{AppError, AppResult};
use crate::identity::Role;
use crate::store::{now_ms, Direction, DocumentStore, Fields, QueryDescriptor, SharedStore, SubscriptionHandle};

use super::models::{self, Appointment, AppointmentStatus, NewAppointment, Patient, Stored};
use super::{users, APPOINTMENTS_COLLECTION, PATIENTS_COLLECTION};

pub type AppointmentsCallback = Arc<dyn Fn(Vec<Stored<Appointment>>) + Send + Sync>;

pub fn today_str() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

pub fn create_appointment(store: &SharedStore, new: NewAppointment) -> AppResult<String> {
    let patient_doc = store
        .get(PATIENTS_COLLECTION, &new.patient_id)?
        .ok_or_else(|| AppError::not_found("patient_not_found", "Patient not found"))?;
    let patient: Stored<Patient> = models::from_document(patient_doc)?;

    let doctor = users::require_doctor(store, &new.doctor_id)?;

    let now = now_ms();
    let appointment = Appointment {
        patient_id: new.patient_id,
        patient_name: patient.record.name,
        patient_phone: patient.record.phone,
        doctor_id: new.doctor_id,
        doctor_name: doctor.record.name,
        specialization: doctor.record.specialization.unwrap_or_else(|| "General".to_string()),
        date: new.date,
        time: new.time,
        reason: new.reason,
        status: AppointmentStatus::Scheduled,
        created_at: now,
        updated_at: now,
    };
    let id = store.add(APPOINTMENTS_COLLECTION, models::to_fields(&appointment)?)?;
    info!(
        target: "carepulse::clinic",
        "appointment created id={} doctor={} date={}",
        id, appointment.doctor_id, appointment.date
    );
    Ok(id)
}

pub fn update_appointment_status(store: &SharedStore, id: &str, status: AppointmentStatus) -> AppResult<()> {
    let mut patch = Fields::new();
    patch.insert("status".into(), status.as_str().into());
    patch.insert("updatedAt".into(), now_ms().into());
    store.update(APPOINTMENTS_COLLECTION, id, patch)?;
    Ok(())
}

pub fn delete_appointment(store: &SharedStore, id: &str) -> AppResult<()> {
    store.delete(APPOINTMENTS_COLLECTION, id)?;
    Ok(())
}

/// Live list of all appointments, newest first.
pub fn subscribe_appointments(store: &SharedStore, on_change: AppointmentsCallback) -> SubscriptionHandle {
    let descriptor =
        QueryDescriptor::collection(APPOINTMENTS_COLLECTION).order_by("createdAt", Direction::Descending);
    store.subscribe(descriptor, Arc::new(move |docs| on_change(models::decode_all(docs))))
}

pub fn appointments_count(store: &SharedStore) -> AppResult<usize> {
    Ok(store.count(&QueryDescriptor::collection(APPOINTMENTS_COLLECTION))?)
}

/// Appointments on one calendar day, earliest first, optionally narrowed to a
/// doctor. `today_appointments` is the dashboard convenience over this.
pub fn appointments_on(
    store: &SharedStore,
    date: &str,
    doctor_id: Option<&str>,
) -> AppResult<Vec<Stored<Appointment>>> {
    let mut descriptor = QueryDescriptor::collection(APPOINTMENTS_COLLECTION).filter_eq("date", date);
    if let Some(doctor_id) = doctor_id {
        descriptor = descriptor.filter_eq("doctorId", doctor_id);
    }
    let descriptor = descriptor.order_by("time", Direction::Ascending);
    store
        .query(&descriptor)?
        .into_iter()
        .map(models::from_document)
        .collect()
}

pub fn today_appointments(store: &SharedStore, doctor_id: Option<&str>) -> AppResult<Vec<Stored<Appointment>>> {
    appointments_on(store, &today_str(), doctor_id)
}

/// The appointment list a signed-in role sees: doctors their own schedule,
/// patients their own visits, staff everything. Newest first.
pub fn appointments_for_role(store: &SharedStore, role: Role, uid: &str) -> AppResult<Vec<Stored<Appointment>>> {
    let descriptor = QueryDescriptor::collection(APPOINTMENTS_COLLECTION);
    let descriptor = match role {
        Role::Doctor => descriptor.filter_eq("doctorId", uid),
        Role::Patient => descriptor.filter_eq("patientId", uid),
        Role::Admin | Role::Receptionist => descriptor,
    };
    let descriptor = descriptor.order_by("createdAt", Direction::Descending);
    store
        .query(&descriptor)?
        .into_iter()
        .map(models::from_document)
        .collect()
}
