//! First-run demo dataset. Guarded by an "any doctor present" probe so a
//! restart against a populated store does nothing; a fresh store gets a
//! plausible roster of doctors, patients and upcoming appointments.

use chrono::{Days, Utc};
use once_cell::sync::Lazy;
use tracing::info;

use crate::error::AppResult;
use crate::identity::Role;
use crate::store::{now_ms, DocumentStore, QueryDescriptor, SharedStore};

use super::models::{self, Appointment, AppointmentStatus, NewPatient, NewUser};
use super::{users, APPOINTMENTS_COLLECTION, PATIENTS_COLLECTION, USERS_COLLECTION};

static DEMO_DOCTORS: Lazy<Vec<NewUser>> = Lazy::new(|| {
    [
        ("Dr. Ahmed Khan", "ahmed.khan@carepulse.local", "Cardiologist", "+92 300 1234567"),
        ("Dr. Sara Ali", "sara.ali@carepulse.local", "Dentist", "+92 301 2345678"),
        ("Dr. Usman Tariq", "usman.tariq@carepulse.local", "Neurologist", "+92 302 3456789"),
        ("Dr. Hina Malik", "hina.malik@carepulse.local", "Pediatrician", "+92 303 4567890"),
        ("Dr. Bilal Ahmed", "bilal.ahmed@carepulse.local", "General Physician", "+92 304 5678901"),
        ("Dr. Fatima Noor", "fatima.noor@carepulse.local", "Dermatologist", "+92 305 6789012"),
    ]
    .into_iter()
    .map(|(name, email, specialization, phone)| NewUser {
        name: name.to_string(),
        email: email.to_string(),
        role: Role::Doctor,
        specialization: Some(specialization.to_string()),
        phone: Some(phone.to_string()),
    })
    .collect()
});

static DEMO_PATIENTS: Lazy<Vec<NewPatient>> = Lazy::new(|| {
    [
        ("Ali Raza", 28, "Male", "+92 321 1112223"),
        ("Hassan Ahmed", 35, "Male", "+92 321 4445556"),
        ("Ayesha Khan", 24, "Female", "+92 321 7778889"),
        ("Maryam Ali", 31, "Female", "+92 321 0001112"),
        ("Zain Malik", 19, "Male", "+92 321 3334445"),
        ("Umar Farooq", 42, "Male", "+92 321 6667778"),
        ("Sana Javed", 27, "Female", "+92 321 9990001"),
        ("Bilal Siddiqui", 38, "Male", "+92 321 8887776"),
    ]
    .into_iter()
    .map(|(name, age, gender, phone)| NewPatient {
        name: name.to_string(),
        phone: phone.to_string(),
        age: Some(age),
        gender: Some(gender.to_string()),
    })
    .collect()
});

const SEED_STATUSES: [AppointmentStatus; 3] =
    [AppointmentStatus::Confirmed, AppointmentStatus::Pending, AppointmentStatus::Completed];

/// Returns whether anything was inserted.
pub fn seed_demo_data(store: &SharedStore) -> AppResult<bool> {
    let probe = QueryDescriptor::collection(USERS_COLLECTION)
        .filter_eq("role", Role::Doctor.as_str())
        .limit(1);
    if !store.query(&probe)?.is_empty() {
        info!(target: "carepulse::clinic", "demo data already present, skipping seed");
        return Ok(false);
    }

    let mut doctor_ids = Vec::with_capacity(DEMO_DOCTORS.len());
    for doctor in DEMO_DOCTORS.iter() {
        doctor_ids.push(users::create_user(store, doctor.clone())?);
    }

    let now = now_ms();
    let mut patient_ids = Vec::with_capacity(DEMO_PATIENTS.len());
    for patient in DEMO_PATIENTS.iter() {
        let record = models::Patient {
            name: patient.name.clone(),
            phone: patient.phone.clone(),
            age: patient.age,
            gender: patient.gender.clone(),
            linked_doctor_id: None,
            created_at: now,
            updated_at: now,
        };
        patient_ids.push(store.add(PATIENTS_COLLECTION, models::to_fields(&record)?)?);
    }

    let today = Utc::now().date_naive();
    let mut appointment_count = 0usize;
    for (i, (doctor, patient)) in DEMO_DOCTORS.iter().zip(DEMO_PATIENTS.iter()).enumerate() {
        let date = today
            .checked_add_days(Days::new((i + 2) as u64))
            .unwrap_or(today)
            .format("%Y-%m-%d")
            .to_string();
        let appointment = Appointment {
            patient_id: patient_ids[i].clone(),
            patient_name: patient.name.clone(),
            patient_phone: patient.phone.clone(),
            doctor_id: doctor_ids[i].clone(),
            doctor_name: doctor.name.clone(),
            specialization: doctor.specialization.clone().unwrap_or_else(|| "General".to_string()),
            date,
            time: Some(format!("{:02}:00", 9 + i)),
            reason: None,
            status: SEED_STATUSES[i % SEED_STATUSES.len()],
            created_at: now,
            updated_at: now,
        };
        store.add(APPOINTMENTS_COLLECTION, models::to_fields(&appointment)?)?;
        appointment_count += 1;
    }

    info!(
        target: "carepulse::clinic",
        "seeded demo data: {} doctors, {} patients, {} appointments",
        doctor_ids.len(),
        patient_ids.len(),
        appointment_count
    );
    Ok(true)
}
