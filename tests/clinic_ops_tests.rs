//! End-to-end clinic operations against the in-memory store: referential
//! checks before writes, denormalised creation-time snapshots, public booking
//! dedup and demo seeding.

use carepulse::clinic::{
    appointments, models, patients, prescriptions, seed, users, Appointment, AppointmentStatus,
    BookingRequest, Medication, NewAppointment, NewPatient, NewPrescription, NewUser, Patient,
};
use carepulse::error::AppError;
use carepulse::identity::Role;
use carepulse::store::{DocumentStore, Fields, MemoryStore, SharedStore};
use carepulse::tprintln;
use serde_json::json;

fn add_doctor(store: &SharedStore, name: &str, specialization: &str) -> String {
    users::create_user(
        store,
        NewUser {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace([' ', '.'], "")),
            role: Role::Doctor,
            specialization: Some(specialization.to_string()),
            phone: None,
        },
    )
    .unwrap()
}

fn add_patient(store: &SharedStore, name: &str, phone: &str) -> String {
    patients::create_patient(
        store,
        NewPatient {
            name: name.to_string(),
            phone: phone.to_string(),
            age: Some(40),
            gender: None,
        },
    )
    .unwrap()
}

fn patch(value: serde_json::Value) -> Fields {
    match value {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    }
}

#[test]
fn patient_round_trip() {
    let store = MemoryStore::shared();
    let id = add_patient(&store, "Meera Joshi", "9876500010");

    let doc = store.get("patients", &id).unwrap().unwrap();
    let stored = models::from_document::<Patient>(doc).unwrap();
    assert_eq!(stored.record.name, "Meera Joshi");
    assert_eq!(stored.record.phone, "9876500010");
    assert_eq!(stored.record.age, Some(40));
    assert!(stored.record.created_at > 0);
}

#[test]
fn appointment_with_unknown_doctor_is_rejected_without_write() {
    let store = MemoryStore::shared();
    let patient_id = add_patient(&store, "Meera Joshi", "9876500010");

    let err = appointments::create_appointment(
        &store,
        NewAppointment {
            patient_id,
            doctor_id: "ghost".to_string(),
            date: appointments::today_str(),
            time: None,
            reason: None,
        },
    )
    .unwrap_err();
    assert_eq!(err.message(), "Doctor not found or invalid");
    assert!(matches!(err, AppError::NotFound { .. }));
    assert_eq!(appointments::appointments_count(&store).unwrap(), 0);
}

#[test]
fn appointment_with_non_doctor_user_is_rejected() {
    let store = MemoryStore::shared();
    let patient_id = add_patient(&store, "Meera Joshi", "9876500010");
    let clerk_id = users::create_user(
        &store,
        NewUser {
            name: "Front Desk".to_string(),
            email: "desk@example.com".to_string(),
            role: Role::Receptionist,
            specialization: None,
            phone: None,
        },
    )
    .unwrap();

    let err = appointments::create_appointment(
        &store,
        NewAppointment {
            patient_id,
            doctor_id: clerk_id,
            date: appointments::today_str(),
            time: None,
            reason: None,
        },
    )
    .unwrap_err();
    assert_eq!(err.message(), "Doctor not found or invalid");
    assert_eq!(appointments::appointments_count(&store).unwrap(), 0);
}

#[test]
fn appointment_snapshot_survives_later_renames_and_deletes() {
    let store = MemoryStore::shared();
    let doctor_id = add_doctor(&store, "Dr. Khan", "Cardiology");
    let patient_id = add_patient(&store, "Meera Joshi", "9876500010");

    let appointment_id = appointments::create_appointment(
        &store,
        NewAppointment {
            patient_id: patient_id.clone(),
            doctor_id: doctor_id.clone(),
            date: "2026-09-05".to_string(),
            time: Some("10:30".to_string()),
            reason: Some("Follow-up".to_string()),
        },
    )
    .unwrap();

    patients::update_patient(&store, &patient_id, patch(json!({"name": "Meera Sharma"}))).unwrap();
    let doc = store.get("appointments", &appointment_id).unwrap().unwrap();
    let stored = models::from_document::<Appointment>(doc).unwrap();
    assert_eq!(stored.record.patient_name, "Meera Joshi");
    assert_eq!(stored.record.doctor_name, "Dr. Khan");
    assert_eq!(stored.record.specialization, "Cardiology");
    assert_eq!(stored.record.status, AppointmentStatus::Scheduled);

    // Deleting the patient leaves the snapshot behind as a ghost reference.
    patients::delete_patient(&store, &patient_id).unwrap();
    let doc = store.get("appointments", &appointment_id).unwrap().unwrap();
    assert_eq!(doc.str_field("patientName"), Some("Meera Joshi"));

    // New appointments for the deleted patient are refused.
    let err = appointments::create_appointment(
        &store,
        NewAppointment {
            patient_id,
            doctor_id,
            date: "2026-09-06".to_string(),
            time: None,
            reason: None,
        },
    )
    .unwrap_err();
    assert_eq!(err.message(), "Patient not found");
}

#[test]
fn public_booking_dedupes_patients_by_phone() {
    let store = MemoryStore::shared();
    let doctor_id = add_doctor(&store, "Dr. Khan", "Cardiology");

    let first = patients::book_public_appointment(
        &store,
        BookingRequest {
            patient_name: "Walk In".to_string(),
            phone: "9990001111".to_string(),
            doctor_id: doctor_id.clone(),
            date: "2026-09-05".to_string(),
        },
    )
    .unwrap();
    // Same phone, different spelling of the name: the existing record wins.
    let second = patients::book_public_appointment(
        &store,
        BookingRequest {
            patient_name: "Walk-In Again".to_string(),
            phone: "9990001111".to_string(),
            doctor_id,
            date: "2026-09-06".to_string(),
        },
    )
    .unwrap();
    assert_ne!(first, second);

    assert_eq!(patients::patients_count(&store).unwrap(), 1);
    let found = patients::find_patient_by_phone(&store, "9990001111").unwrap().unwrap();
    assert_eq!(found.record.name, "Walk In");

    let list = appointments::appointments_for_role(&store, Role::Receptionist, "ignored").unwrap();
    assert_eq!(list.len(), 2);
    assert!(list.iter().all(|a| a.record.status == AppointmentStatus::Pending));
    tprintln!("booked {} pending walk-in appointments", list.len());
}

#[test]
fn create_patient_with_appointment_links_doctor_and_books_today() {
    let store = MemoryStore::shared();
    let doctor_id = add_doctor(&store, "Dr. Khan", "Cardiology");

    let patient_id = patients::create_patient_with_appointment(
        &store,
        NewPatient {
            name: "Meera Joshi".to_string(),
            phone: "9876500010".to_string(),
            age: None,
            gender: Some("female".to_string()),
        },
        &doctor_id,
    )
    .unwrap();

    let doc = store.get("patients", &patient_id).unwrap().unwrap();
    assert_eq!(doc.str_field("linkedDoctorId"), Some(doctor_id.as_str()));

    let today = appointments::today_appointments(&store, Some(&doctor_id)).unwrap();
    assert_eq!(today.len(), 1);
    assert_eq!(today[0].record.patient_id, patient_id);
    assert_eq!(today[0].record.status, AppointmentStatus::Scheduled);
}

#[test]
fn appointment_status_updates_and_missing_ids_error() {
    let store = MemoryStore::shared();
    let doctor_id = add_doctor(&store, "Dr. Khan", "Cardiology");
    let patient_id = add_patient(&store, "Meera Joshi", "9876500010");
    let appointment_id = appointments::create_appointment(
        &store,
        NewAppointment {
            patient_id,
            doctor_id,
            date: "2026-09-05".to_string(),
            time: None,
            reason: None,
        },
    )
    .unwrap();

    appointments::update_appointment_status(&store, &appointment_id, AppointmentStatus::Completed)
        .unwrap();
    let doc = store.get("appointments", &appointment_id).unwrap().unwrap();
    assert_eq!(doc.str_field("status"), Some("completed"));

    let err = appointments::update_appointment_status(&store, "missing", AppointmentStatus::Confirmed)
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

#[test]
fn day_schedule_orders_by_time() {
    let store = MemoryStore::shared();
    let doctor_id = add_doctor(&store, "Dr. Khan", "Cardiology");
    let patient_id = add_patient(&store, "Meera Joshi", "9876500010");

    for time in ["14:00", "09:30", "11:15"] {
        appointments::create_appointment(
            &store,
            NewAppointment {
                patient_id: patient_id.clone(),
                doctor_id: doctor_id.clone(),
                date: "2026-09-05".to_string(),
                time: Some(time.to_string()),
                reason: None,
            },
        )
        .unwrap();
    }

    let day = appointments::appointments_on(&store, "2026-09-05", None).unwrap();
    let times: Vec<_> = day.iter().map(|a| a.record.time.clone().unwrap()).collect();
    assert_eq!(times, vec!["09:30", "11:15", "14:00"]);
}

#[test]
fn appointments_are_scoped_by_role() {
    let store = MemoryStore::shared();
    let doctor_a = add_doctor(&store, "Dr. Khan", "Cardiology");
    let doctor_b = add_doctor(&store, "Dr. Sen", "Dermatology");
    let patient_a = add_patient(&store, "Meera Joshi", "9876500010");
    let patient_b = add_patient(&store, "Ravi Iyer", "9876500011");

    for (patient_id, doctor_id) in [(&patient_a, &doctor_a), (&patient_b, &doctor_a), (&patient_b, &doctor_b)] {
        appointments::create_appointment(
            &store,
            NewAppointment {
                patient_id: patient_id.clone(),
                doctor_id: doctor_id.clone(),
                date: "2026-09-05".to_string(),
                time: None,
                reason: None,
            },
        )
        .unwrap();
    }

    let doctor_view = appointments::appointments_for_role(&store, Role::Doctor, &doctor_a).unwrap();
    assert_eq!(doctor_view.len(), 2);
    assert!(doctor_view.iter().all(|a| a.record.doctor_id == doctor_a));

    let patient_view = appointments::appointments_for_role(&store, Role::Patient, &patient_b).unwrap();
    assert_eq!(patient_view.len(), 2);
    assert!(patient_view.iter().all(|a| a.record.patient_id == patient_b));

    assert_eq!(appointments::appointments_for_role(&store, Role::Admin, "n/a").unwrap().len(), 3);
    assert_eq!(appointments::appointments_for_role(&store, Role::Receptionist, "n/a").unwrap().len(), 3);
}

#[test]
fn prescriptions_validate_parties_and_list_per_patient() {
    let store = MemoryStore::shared();
    let doctor_id = add_doctor(&store, "Dr. Khan", "Cardiology");
    let patient_id = add_patient(&store, "Meera Joshi", "9876500010");

    let err = prescriptions::create_prescription(
        &store,
        NewPrescription {
            patient_id: "ghost".to_string(),
            doctor_id: doctor_id.clone(),
            medications: vec![],
            instructions: String::new(),
        },
    )
    .unwrap_err();
    assert_eq!(err.message(), "Patient not found");

    prescriptions::create_prescription(
        &store,
        NewPrescription {
            patient_id: patient_id.clone(),
            doctor_id: doctor_id.clone(),
            medications: vec![Medication {
                name: "Atorvastatin".to_string(),
                dosage: "10mg".to_string(),
                frequency: "nightly".to_string(),
            }],
            instructions: "After dinner".to_string(),
        },
    )
    .unwrap();

    let list = prescriptions::patient_prescriptions(&store, &patient_id).unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].record.patient_name, "Meera Joshi");
    assert_eq!(list[0].record.doctor_name, "Dr. Khan");
    assert_eq!(list[0].record.medications.len(), 1);
    assert_eq!(prescriptions::doctor_prescriptions_count(&store, &doctor_id).unwrap(), 1);
}

#[test]
fn demo_seed_runs_once() {
    let store = MemoryStore::shared();
    assert!(seed::seed_demo_data(&store).unwrap());
    assert_eq!(users::doctors_count(&store).unwrap(), 6);
    assert_eq!(patients::patients_count(&store).unwrap(), 8);
    assert_eq!(appointments::appointments_count(&store).unwrap(), 6);

    // A second run sees existing doctors and backs off.
    assert!(!seed::seed_demo_data(&store).unwrap());
    assert_eq!(patients::patients_count(&store).unwrap(), 8);
}
