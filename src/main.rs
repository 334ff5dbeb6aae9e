use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use carepulse::clinic::{self, models, seed};
use carepulse::config::Config;
use carepulse::identity::{AuthProvider, LocalAuthProvider, Role, RoleResolver, SessionCell};
use carepulse::store::{now_ms, DocumentStore, MemoryStore};

fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    let config = Config::from_env();
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "startup",
        "CarePulse core starting: RUST_LOG='{}', admin_email='{}', seed={}",
        rust_log, config.admin_email, config.seed_demo_data
    );

    let store = MemoryStore::shared();
    let provider = LocalAuthProvider::new();
    let session = Arc::new(SessionCell::new());
    let resolver = Arc::new(RoleResolver::new(Arc::clone(&store), Arc::clone(&session)));
    let _auth_watch = resolver.attach(&provider);

    // Bootstrap the administrator: account in the provider, user record under
    // its uid so the resolver binds the admin role instead of provisioning.
    let admin = provider.register(&config.admin_email, &config.admin_password, Some("Administrator"))?;
    let admin_record = models::UserRecord {
        name: "Administrator".to_string(),
        email: config.admin_email.clone(),
        role: Role::Admin.as_str().to_string(),
        specialization: None,
        phone: None,
        created_at: now_ms(),
    };
    store.put_new(clinic::USERS_COLLECTION, &admin.uid, models::to_fields(&admin_record)?)?;

    if config.seed_demo_data {
        seed::seed_demo_data(&store)?;
    }

    provider.sign_in(&config.admin_email, &config.admin_password)?;
    let snapshot = session.snapshot();
    info!(
        target: "startup",
        "session ready: email={:?}, role={:?}, loading={}",
        snapshot.identity.as_ref().map(|i| i.email.as_str()),
        snapshot.role,
        snapshot.loading
    );

    info!(
        target: "startup",
        "inventory: patients={}, doctors={}, appointments={}",
        clinic::patients::patients_count(&store)?,
        clinic::users::doctors_count(&store)?,
        clinic::appointments::appointments_count(&store)?
    );

    Ok(())
}
