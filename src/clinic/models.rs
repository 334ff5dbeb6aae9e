//! Record types for the stored documents, serialized with camelCase field
//! names to match the collection document shape, plus the conversion helpers
//! between typed records and raw field maps.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::identity::Role;
use crate::store::{Document, Fields};

/// A stored user: staff accounts and doctor profiles live here. The `role`
/// field stays a string at the document level; it is parsed into the closed
/// `Role` enum wherever a decision depends on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_doctor_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Scheduled,
    Confirmed,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Patient and doctor names, phone and specialization are denormalized into
/// the appointment at creation time for read performance. They are snapshots:
/// later edits to the source records do not propagate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub patient_id: String,
    pub patient_name: String,
    pub patient_phone: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub specialization: String,
    /// YYYY-MM-DD
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub patient_id: String,
    pub patient_name: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub medications: Vec<Medication>,
    pub instructions: String,
    pub created_at: i64,
}

// ---- creation inputs -------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewPatient {
    pub name: String,
    pub phone: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub patient_id: String,
    pub doctor_id: String,
    pub date: String,
    pub time: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPrescription {
    pub patient_id: String,
    pub doctor_id: String,
    pub medications: Vec<Medication>,
    pub instructions: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub specialization: Option<String>,
    pub phone: Option<String>,
}

/// A typed record paired with its document id.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<T> {
    pub id: String,
    pub record: T,
}

// ---- conversions -----------------------------------------------------------

pub fn to_fields<T: Serialize>(record: &T) -> AppResult<Fields> {
    match serde_json::to_value(record) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::internal("encode", "record did not serialize to an object")),
        Err(err) => Err(AppError::internal("encode", err.to_string())),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> AppResult<Stored<T>> {
    let Document { id, fields } = doc;
    match serde_json::from_value(serde_json::Value::Object(fields)) {
        Ok(record) => Ok(Stored { id, record }),
        Err(err) => Err(AppError::internal("decode", err.to_string())),
    }
}

/// Tolerant bulk decode for subscription snapshots: an undecodable document is
/// logged and skipped so one bad record cannot blank a live list.
pub fn decode_all<T: DeserializeOwned>(docs: &[Document]) -> Vec<Stored<T>> {
    docs.iter()
        .cloned()
        .filter_map(|doc| {
            let id = doc.id.clone();
            match from_document::<T>(doc) {
                Ok(stored) => Some(stored),
                Err(err) => {
                    warn!(target: "carepulse::clinic", "skipping undecodable document {id}: {err}");
                    None
                }
            }
        })
        .collect()
}
