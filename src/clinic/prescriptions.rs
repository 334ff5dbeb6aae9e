//! Prescription operations: validated create with denormalized names, plus
//! the per-doctor count and per-patient history the dashboards read.

use crate::error::{AppError, AppResult};
use crate::store::{now_ms, Direction, DocumentStore, QueryDescriptor, SharedStore};

use super::models::{self, NewPrescription, Patient, Prescription, Stored, UserRecord};
use super::{PATIENTS_COLLECTION, PRESCRIPTIONS_COLLECTION, USERS_COLLECTION};

pub fn create_prescription(store: &SharedStore, new: NewPrescription) -> AppResult<String> {
    let patient_doc = store
        .get(PATIENTS_COLLECTION, &new.patient_id)?
        .ok_or_else(|| AppError::not_found("patient_not_found", "Patient not found"))?;
    let patient: Stored<Patient> = models::from_document(patient_doc)?;

    let doctor_doc = store
        .get(USERS_COLLECTION, &new.doctor_id)?
        .ok_or_else(|| AppError::not_found("doctor_not_found", "Doctor not found"))?;
    let doctor: Stored<UserRecord> = models::from_document(doctor_doc)?;

    let prescription = Prescription {
        patient_id: new.patient_id,
        patient_name: patient.record.name,
        doctor_id: new.doctor_id,
        doctor_name: doctor.record.name,
        medications: new.medications,
        instructions: new.instructions,
        created_at: now_ms(),
    };
    let id = store.add(PRESCRIPTIONS_COLLECTION, models::to_fields(&prescription)?)?;
    Ok(id)
}

pub fn doctor_prescriptions_count(store: &SharedStore, doctor_id: &str) -> AppResult<usize> {
    let descriptor = QueryDescriptor::collection(PRESCRIPTIONS_COLLECTION).filter_eq("doctorId", doctor_id);
    Ok(store.count(&descriptor)?)
}

pub fn patient_prescriptions(store: &SharedStore, patient_id: &str) -> AppResult<Vec<Stored<Prescription>>> {
    let descriptor = QueryDescriptor::collection(PRESCRIPTIONS_COLLECTION)
        .filter_eq("patientId", patient_id)
        .order_by("createdAt", Direction::Descending);
    store
        .query(&descriptor)?
        .into_iter()
        .map(models::from_document)
        .collect()
}
