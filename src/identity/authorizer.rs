//! Closed role enumeration and the coarse capability gate. Role strings are
//! validated here, at the boundary; nothing downstream ever handles a role
//! outside the four known values.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Receptionist,
    Patient,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Doctor, Role::Receptionist, Role::Patient];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Receptionist => "receptionist",
            Role::Patient => "patient",
        }
    }

    /// Case-insensitive parse. Returns `None` for anything outside the closed
    /// set; callers decide whether that is an error or a quarantine.
    pub fn parse(value: &str) -> Option<Role> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "doctor" => Some(Role::Doctor),
            "receptionist" => Some(Role::Receptionist),
            "patient" => Some(Role::Patient),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    ManageUsers,
    ManagePatients,
    ManageAppointments,
    Prescribe,
    ViewOwnRecords,
}

/// Coarse capability gate per role. Admin passes everything; staff roles get
/// the day-to-day patient and appointment operations; prescribing is doctors
/// only; every signed-in role may view its own records.
pub fn check_command_allowed(role: Role, cmd: CommandKind) -> bool {
    if role == Role::Admin {
        return true;
    }
    match cmd {
        CommandKind::ManageUsers => false,
        CommandKind::ManagePatients | CommandKind::ManageAppointments => {
            matches!(role, Role::Doctor | Role::Receptionist)
        }
        CommandKind::Prescribe => role == Role::Doctor,
        CommandKind::ViewOwnRecords => true,
    }
}
