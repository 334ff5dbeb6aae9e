//! Environment-variable configuration for the demo binary.

#[derive(Debug, Clone)]
pub struct Config {
    pub admin_email: String,
    pub admin_password: String,
    pub seed_demo_data: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let admin_email = std::env::var("CAREPULSE_ADMIN_EMAIL")
            .unwrap_or_else(|_| "admin@carepulse.local".to_string());
        let admin_password =
            std::env::var("CAREPULSE_ADMIN_PASSWORD").unwrap_or_else(|_| "carepulse".to_string());
        let seed_demo_data = std::env::var("CAREPULSE_SEED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);
        Self { admin_email, admin_password, seed_demo_data }
    }
}
