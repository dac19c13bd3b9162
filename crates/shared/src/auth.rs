//! Authentication types carried in tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims for access tokens.
///
/// The payload is intentionally small: the tenant and the current role are
/// re-read from the database on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Public UUID of the user.
    pub id: Uuid,
    /// User email at the time of issue.
    pub email: String,
    /// User role at the time of issue.
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: Uuid, email: &str, role: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: user_id,
            email: email.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user UUID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_new_sets_correct_fields() {
        let user_id = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::hours(1);

        let claims = Claims::new(user_id, "pm@example.com", "project_manager", expires_at);

        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.email, "pm@example.com");
        assert_eq!(claims.role, "project_manager");
        assert!(claims.iat <= Utc::now().timestamp());
        assert_eq!(claims.exp, expires_at.timestamp());
    }

    #[test]
    fn test_claims_serialize_with_wire_names() {
        let claims = Claims::new(Uuid::nil(), "a@b.c", "finance", Utc::now());
        let value = serde_json::to_value(&claims).unwrap();

        assert!(value.get("id").is_some());
        assert_eq!(value["email"], "a@b.c");
        assert_eq!(value["role"], "finance");
    }
}
