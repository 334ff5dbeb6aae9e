//! Patient operations, including the public booking flow: dedupe the patient
//! by phone number (first match wins, no merge), create one if absent, then
//! book a pending appointment against the chosen doctor.

use std::sync::Arc;

use tracing::info;

use crate::error::AppResult;
use crate::store::{now_ms, Direction, DocumentStore, Fields, QueryDescriptor, SharedStore, SubscriptionHandle};

use super::models::{self, Appointment, AppointmentStatus, NewPatient, Patient, Stored};
use super::{appointments, users, APPOINTMENTS_COLLECTION, PATIENTS_COLLECTION};

pub type PatientsCallback = Arc<dyn Fn(Vec<Stored<Patient>>) + Send + Sync>;

/// Walk-in booking request from the public site: no account, just a name, a
/// phone number and a chosen doctor and day.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub patient_name: String,
    pub phone: String,
    pub doctor_id: String,
    pub date: String,
}

pub fn create_patient(store: &SharedStore, new: NewPatient) -> AppResult<String> {
    let now = now_ms();
    let record = Patient {
        name: new.name,
        phone: new.phone,
        age: new.age,
        gender: new.gender,
        linked_doctor_id: None,
        created_at: now,
        updated_at: now,
    };
    let id = store.add(PATIENTS_COLLECTION, models::to_fields(&record)?)?;
    info!(target: "carepulse::clinic", "patient created id={id}");
    Ok(id)
}

/// Partial update; `updatedAt` is stamped here. Existing appointments keep
/// their denormalized copy of whatever changed.
pub fn update_patient(store: &SharedStore, id: &str, mut patch: Fields) -> AppResult<()> {
    patch.insert("updatedAt".into(), now_ms().into());
    store.update(PATIENTS_COLLECTION, id, patch)?;
    Ok(())
}

pub fn delete_patient(store: &SharedStore, id: &str) -> AppResult<()> {
    store.delete(PATIENTS_COLLECTION, id)?;
    Ok(())
}

/// Live list of patients, newest first.
pub fn subscribe_patients(store: &SharedStore, on_change: PatientsCallback) -> SubscriptionHandle {
    let descriptor =
        QueryDescriptor::collection(PATIENTS_COLLECTION).order_by("createdAt", Direction::Descending);
    store.subscribe(descriptor, Arc::new(move |docs| on_change(models::decode_all(docs))))
}

pub fn patients_count(store: &SharedStore) -> AppResult<usize> {
    Ok(store.count(&QueryDescriptor::collection(PATIENTS_COLLECTION))?)
}

/// Phone-number dedup lookup. First match wins; duplicates are never merged.
pub fn find_patient_by_phone(store: &SharedStore, phone: &str) -> AppResult<Option<Stored<Patient>>> {
    let descriptor = QueryDescriptor::collection(PATIENTS_COLLECTION)
        .filter_eq("phone", phone)
        .limit(1);
    store
        .query(&descriptor)?
        .into_iter()
        .next()
        .map(models::from_document)
        .transpose()
}

pub fn book_public_appointment(store: &SharedStore, request: BookingRequest) -> AppResult<String> {
    let doctor = users::require_doctor(store, &request.doctor_id)?;

    let patient_id = match find_patient_by_phone(store, &request.phone)? {
        Some(existing) => existing.id,
        None => {
            let now = now_ms();
            let record = Patient {
                name: request.patient_name.clone(),
                phone: request.phone.clone(),
                age: None,
                gender: None,
                linked_doctor_id: None,
                created_at: now,
                updated_at: now,
            };
            store.add(PATIENTS_COLLECTION, models::to_fields(&record)?)?
        }
    };

    let now = now_ms();
    let appointment = Appointment {
        patient_id,
        patient_name: request.patient_name,
        patient_phone: request.phone,
        doctor_id: request.doctor_id,
        doctor_name: doctor.record.name,
        specialization: doctor.record.specialization.unwrap_or_else(|| "General".to_string()),
        date: request.date,
        time: None,
        reason: None,
        status: AppointmentStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    let id = store.add(APPOINTMENTS_COLLECTION, models::to_fields(&appointment)?)?;
    info!(target: "carepulse::clinic", "public booking created appointment id={id}");
    Ok(id)
}

/// Staff shortcut: register a patient linked to a doctor and book a same-day
/// appointment in one go. Returns the new patient's id.
pub fn create_patient_with_appointment(
    store: &SharedStore,
    new: NewPatient,
    doctor_id: &str,
) -> AppResult<String> {
    let doctor = users::require_doctor(store, doctor_id)?;

    let now = now_ms();
    let record = Patient {
        name: new.name.clone(),
        phone: new.phone.clone(),
        age: new.age,
        gender: new.gender,
        linked_doctor_id: Some(doctor_id.to_string()),
        created_at: now,
        updated_at: now,
    };
    let patient_id = store.add(PATIENTS_COLLECTION, models::to_fields(&record)?)?;

    let appointment = Appointment {
        patient_id: patient_id.clone(),
        patient_name: new.name,
        patient_phone: new.phone,
        doctor_id: doctor_id.to_string(),
        doctor_name: doctor.record.name,
        specialization: doctor.record.specialization.unwrap_or_else(|| "General".to_string()),
        date: appointments::today_str(),
        time: None,
        reason: None,
        status: AppointmentStatus::Scheduled,
        created_at: now,
        updated_at: now,
    };
    store.add(APPOINTMENTS_COLLECTION, models::to_fields(&appointment)?)?;

    Ok(patient_id)
}
