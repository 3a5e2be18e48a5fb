use chrono::{DateTime, Utc};
use eventbook_shared::Masked;
use serde::Serialize;
use uuid::Uuid;

use crate::identity::{Identity, Role};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Masked<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn identity(&self) -> Identity {
        Identity::new(self.id, self.role)
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: Masked<String>,
    pub role: Role,
}

impl NewUser {
    pub fn into_user(self) -> User {
        User {
            id: Uuid::new_v4(),
            name: self.name,
            email: normalize_email(&self.email),
            password_hash: self.password_hash,
            role: self.role,
            created_at: Utc::now(),
        }
    }
}

/// Emails are unique case-insensitively; store and look them up trimmed and
/// lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_email_on_creation() {
        let user = NewUser {
            name: "Jane".to_string(),
            email: "  Jane@Example.COM ".to_string(),
            password_hash: Masked::new("hash".to_string()),
            role: Role::User,
        }
        .into_user();

        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.identity(), Identity::new(user.id, Role::User));
    }

    #[test]
    fn password_hash_never_serialized_or_logged() {
        let user = NewUser {
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            password_hash: Masked::new("$2b$10$secret".to_string()),
            role: Role::Admin,
        }
        .into_user();

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "admin");
        assert!(!format!("{:?}", user).contains("secret"));
    }
}
