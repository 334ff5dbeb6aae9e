use serde::{Deserialize, Serialize};

/// An authenticated principal as issued by the auth provider. Ephemeral: the
/// core never persists it, only the derived user record keyed by `uid`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
}
