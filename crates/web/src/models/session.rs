//! Session-related types.
//!
//! The auth service owns the session; these types mirror what it reports
//! for the visitor's cookie.

use serde::{Deserialize, Serialize};

use medistore_core::{Role, UserId, UserStatus};

/// The signed-in user as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub image: Option<String>,
}

impl SessionUser {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    #[must_use]
    pub fn is_seller(&self) -> bool {
        self.role == Role::Seller
    }

    /// Banned accounts keep their cookie but may not use the dashboards.
    #[must_use]
    pub fn is_banned(&self) -> bool {
        self.status == UserStatus::Banned
    }

    /// Initial shown in the navigation avatar.
    #[must_use]
    pub fn initial(&self) -> String {
        self.name
            .chars()
            .next()
            .map_or_else(|| "?".to_string(), |c| c.to_uppercase().to_string())
    }
}

/// Session keys for data stored in the frontend's own session.
pub mod keys {
    /// Key for the visitor's cart (JSON array of cart items).
    pub const CART: &str = "medistore-cart";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_user_defaults() {
        let user: SessionUser = serde_json::from_str(
            r#"{"id":"u1","name":"ada","email":"ada@example.com"}"#,
        )
        .unwrap();
        assert_eq!(user.role, Role::Customer);
        assert_eq!(user.status, UserStatus::Active);
        assert!(!user.email_verified);
        assert_eq!(user.initial(), "A");
    }

    #[test]
    fn test_session_user_roles() {
        let user: SessionUser = serde_json::from_str(
            r#"{"id":"u2","name":"Root","email":"root@example.com","role":"ADMIN","status":"BANNED","emailVerified":true}"#,
        )
        .unwrap();
        assert!(user.is_admin());
        assert!(!user.is_seller());
        assert!(user.is_banned());
        assert!(user.email_verified);
    }
}
