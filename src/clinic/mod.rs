//!
//! carepulse clinic domain
//! -----------------------
//! Typed records for the four collections plus the operations the dashboards
//! and forms call: patient/appointment/prescription/user writes, live list
//! subscriptions, and the composed dashboard stats feed. All operations are
//! free functions over a `SharedStore`; expected failures (missing referenced
//! patient/doctor) come back as typed `AppError` values, never panics.
//!
//! Cross-document writes are read-then-write with no isolation: denormalized
//! names are a creation-time snapshot and are never updated afterwards, and a
//! record deleted between the read and the write leaves stale denormalized
//! fields behind. That staleness is the documented behavior at this scale.

pub mod appointments;
pub mod dashboard;
pub mod models;
pub mod patients;
pub mod prescriptions;
pub mod seed;
pub mod users;

pub const USERS_COLLECTION: &str = "users";
pub const PATIENTS_COLLECTION: &str = "patients";
pub const APPOINTMENTS_COLLECTION: &str = "appointments";
pub const PRESCRIPTIONS_COLLECTION: &str = "prescriptions";

pub use dashboard::{subscribe_dashboard_stats, DashboardStats, StatsCallback};
pub use models::{
    Appointment, AppointmentStatus, Medication, NewAppointment, NewPatient, NewPrescription,
    NewUser, Patient, Prescription, Stored, UserRecord,
};
pub use patients::BookingRequest;
