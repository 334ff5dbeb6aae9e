//! Role resolution: reacts to every auth-state event, fetches or provisions
//! the user record for the identity and drives the session cell to its next
//! state. Any lookup or provisioning failure resolves to the anonymous
//! session; the cell is never left partially authenticated.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::clinic::models::{self, UserRecord};
use crate::clinic::USERS_COLLECTION;
use crate::error::{AppError, AppResult};
use crate::store::{now_ms, DocumentStore, SharedStore, SubscriptionHandle};

use super::authorizer::Role;
use super::principal::Identity;
use super::provider::AuthProvider;
use super::session::{SessionCell, SessionSnapshot};

/// Role granted to identities with no existing user record: the
/// lowest-privilege one. Operators promote accounts explicitly.
pub const DEFAULT_ROLE: Role = Role::Patient;

pub struct RoleResolver {
    store: SharedStore,
    session: Arc<SessionCell>,
}

impl RoleResolver {
    pub fn new(store: SharedStore, session: Arc<SessionCell>) -> Self {
        Self { store, session }
    }

    /// Wire this resolver to a provider's auth-state stream. The stream fires
    /// once immediately, so attaching also completes the initial `loading`
    /// phase of the session.
    pub fn attach(self: &Arc<Self>, provider: &dyn AuthProvider) -> SubscriptionHandle {
        let resolver = Arc::clone(self);
        provider.on_auth_state_changed(Arc::new(move |identity| resolver.on_auth_event(identity)))
    }

    /// Handle one auth-state event. Each call supersedes the previous one:
    /// the resolution is applied only if no newer event arrived meanwhile.
    pub fn on_auth_event(&self, identity: Option<Identity>) {
        let epoch = self.session.begin_event();
        let next = match identity {
            None => SessionSnapshot::anonymous(),
            Some(identity) => match self.resolve_role(&identity) {
                Ok(role) => SessionSnapshot::authenticated(identity, role),
                Err(err) => {
                    warn!(
                        target: "carepulse::identity",
                        "role resolution failed for uid={}: {err}; reverting to anonymous",
                        identity.uid
                    );
                    SessionSnapshot::anonymous()
                }
            },
        };
        if !self.session.apply_if_current(epoch, next) {
            debug!(target: "carepulse::identity", "auth event {epoch} superseded, result dropped");
        }
    }

    fn resolve_role(&self, identity: &Identity) -> AppResult<Role> {
        if let Some(doc) = self.store.get(USERS_COLLECTION, &identity.uid)? {
            let raw = doc.str_field("role").unwrap_or_default();
            return Role::parse(raw).ok_or_else(|| {
                AppError::auth("unknown_role", format!("unrecognized role '{raw}' quarantined"))
            });
        }

        // First sign-in: provision a record under the identity's uid.
        let record = UserRecord {
            name: identity.display_name.clone().unwrap_or_else(|| "User".to_string()),
            email: identity.email.clone(),
            role: DEFAULT_ROLE.as_str().to_string(),
            specialization: None,
            phone: None,
            created_at: now_ms(),
        };
        if self.store.put_new(USERS_COLLECTION, &identity.uid, models::to_fields(&record)?)? {
            info!(
                target: "carepulse::identity",
                "provisioned user record uid={} role={}",
                identity.uid, DEFAULT_ROLE
            );
            return Ok(DEFAULT_ROLE);
        }

        // Lost the provisioning race; the winner's record is authoritative.
        let doc = self
            .store
            .get(USERS_COLLECTION, &identity.uid)?
            .ok_or_else(|| AppError::internal("provision_race", "user record vanished during provisioning"))?;
        let raw = doc.str_field("role").unwrap_or_default();
        Role::parse(raw).ok_or_else(|| {
            AppError::auth("unknown_role", format!("unrecognized role '{raw}' quarantined"))
        })
    }
}
