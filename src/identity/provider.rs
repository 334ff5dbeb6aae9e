//! Auth provider boundary. `AuthProvider` is the contract the role resolver
//! is written against; `LocalAuthProvider` is the in-process implementation
//! with an Argon2-hashed account table and auth-state listeners that fire once
//! immediately at registration time, then on every sign-in/sign-out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use base64::Engine;
use parking_lot::RwLock;
use password_hash::{PasswordHash, SaltString};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::store::SubscriptionHandle;

use super::principal::Identity;

/// Auth-state listener. Receives the current identity (or `None` when signed
/// out) once at subscribe time and after every session change.
pub type AuthListener = Arc<dyn Fn(Option<Identity>) + Send + Sync>;

pub trait AuthProvider: Send + Sync {
    fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity>;
    fn sign_out(&self);
    fn current_identity(&self) -> Option<Identity>;
    fn on_auth_state_changed(&self, listener: AuthListener) -> SubscriptionHandle;
}

struct Account {
    identity: Identity,
    password_phc: String,
}

pub struct LocalAuthProvider {
    /// Keyed by lowercased email.
    accounts: RwLock<HashMap<String, Account>>,
    current: RwLock<Option<Identity>>,
    listeners: Arc<RwLock<HashMap<u64, AuthListener>>>,
    next_listener_id: AtomicU64,
}

fn gen_uid() -> String {
    // 128-bit random id, base64url without padding
    let mut buf = [0u8; 16];
    let _ = getrandom::getrandom(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}

fn hash_password(password: &str) -> AppResult<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes)
        .map_err(|e| AppError::internal("salt", e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::internal("salt_b64", e.to_string()))?;
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::internal("hash", e.to_string()))?
        .to_string();
    Ok(phc)
}

fn verify_password(phc: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(phc) {
        Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
    } else {
        false
    }
}

impl Default for LocalAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalAuthProvider {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            current: RwLock::new(None),
            listeners: Arc::new(RwLock::new(HashMap::new())),
            next_listener_id: AtomicU64::new(1),
        }
    }

    /// Create an account and return its identity. Does not sign the account
    /// in; callers pair this with `sign_in` when they want a session.
    pub fn register(&self, email: &str, password: &str, display_name: Option<&str>) -> AppResult<Identity> {
        let key = email.to_ascii_lowercase();
        let phc = hash_password(password)?;
        let identity = Identity {
            uid: gen_uid(),
            email: email.to_string(),
            display_name: display_name.map(str::to_string),
        };
        let mut accounts = self.accounts.write();
        if accounts.contains_key(&key) {
            return Err(AppError::user("email_taken", "an account with this email already exists"));
        }
        accounts.insert(key, Account { identity: identity.clone(), password_phc: phc });
        Ok(identity)
    }

    fn notify(&self, identity: Option<Identity>) {
        let listeners = self.listeners.read();
        for listener in listeners.values() {
            listener(identity.clone());
        }
    }
}

impl AuthProvider for LocalAuthProvider {
    fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity> {
        let key = email.to_ascii_lowercase();
        let identity = {
            let accounts = self.accounts.read();
            let Some(account) = accounts.get(&key) else {
                return Err(AppError::auth("invalid_credentials", "invalid email or password"));
            };
            if !verify_password(&account.password_phc, password) {
                return Err(AppError::auth("invalid_credentials", "invalid email or password"));
            }
            account.identity.clone()
        };
        *self.current.write() = Some(identity.clone());
        info!(target: "carepulse::identity", "auth.sign_in uid={}", identity.uid);
        self.notify(Some(identity.clone()));
        Ok(identity)
    }

    fn sign_out(&self) {
        let previous = self.current.write().take();
        if let Some(identity) = previous {
            info!(target: "carepulse::identity", "auth.sign_out uid={}", identity.uid);
        }
        self.notify(None);
    }

    fn current_identity(&self) -> Option<Identity> {
        self.current.read().clone()
    }

    fn on_auth_state_changed(&self, listener: AuthListener) -> SubscriptionHandle {
        let id = self.next_listener_id.fetch_add(1, AtomicOrdering::SeqCst);
        {
            self.listeners.write().insert(id, listener);
        }
        // Immediate delivery with the current state, under the read lock so a
        // racing unsubscribe waits for it.
        {
            let listeners = self.listeners.read();
            if let Some(listener) = listeners.get(&id) {
                listener(self.current_identity());
            }
        }
        let listeners = Arc::clone(&self.listeners);
        SubscriptionHandle::new(move || {
            listeners.write().remove(&id);
        })
    }
}
