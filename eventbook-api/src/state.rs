use std::sync::Arc;
use eventbook_core::user::normalize_email;
use eventbook_core::{BookingLedger, EventRepository, UserRepository};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
    pub bcrypt_cost: u32,
    pub admin_emails: Vec<String>,
}

impl AuthConfig {
    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = normalize_email(email);
        self.admin_emails.iter().any(|a| normalize_email(a) == email)
    }
}

impl From<&eventbook_store::app_config::AuthConfig> for AuthConfig {
    fn from(config: &eventbook_store::app_config::AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expiration: config.jwt_expiration_seconds,
            bcrypt_cost: config.bcrypt_cost,
            admin_emails: config.admin_emails.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub events: Arc<dyn EventRepository>,
    pub ledger: Arc<dyn BookingLedger>,
    pub users: Arc<dyn UserRepository>,
    pub auth: AuthConfig,
    /// Empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl AppState {
    pub fn new(
        events: Arc<dyn EventRepository>,
        ledger: Arc<dyn BookingLedger>,
        users: Arc<dyn UserRepository>,
        auth: AuthConfig,
    ) -> Self {
        Self {
            events,
            ledger,
            users,
            auth,
            cors_origins: Vec::new(),
        }
    }

    /// Wires every repository seam to one backing store.
    pub fn with_store<S>(store: Arc<S>, auth: AuthConfig) -> Self
    where
        S: EventRepository + BookingLedger + UserRepository + 'static,
    {
        Self::new(store.clone(), store.clone(), store, auth)
    }

    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventbook_store::MemoryStore;

    fn auth() -> AuthConfig {
        AuthConfig {
            secret: "state-secret".to_string(),
            expiration: 60,
            bcrypt_cost: 4,
            admin_emails: vec!["Boss@Example.com".to_string()],
        }
    }

    #[test]
    fn constructors_start_with_open_cors_until_configured() {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), store.clone(), store, auth());
        assert!(state.cors_origins.is_empty());

        let state = AppState::with_store(Arc::new(MemoryStore::new()), auth())
            .with_cors_origins(vec!["http://localhost:3000".to_string()]);
        assert_eq!(state.cors_origins, vec!["http://localhost:3000"]);
    }

    #[test]
    fn admin_emails_match_case_insensitively() {
        let auth = auth();
        assert!(auth.is_admin_email("  boss@example.COM "));
        assert!(!auth.is_admin_email("staff@example.com"));
    }
}
