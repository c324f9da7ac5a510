//! Caller identity attached to requests by the session gate.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User role. Everything that is not an admin is a regular user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular account: owns its bookings, subscriptions and
    /// notifications.
    User,
    /// Administrative account: manages hotels and any booking.
    Admin,
}

impl Role {
    /// Parses a stored role string, defaulting unknown values to
    /// [`Role::User`].
    #[must_use]
    pub fn from_str_or_user(value: &str) -> Self {
        match value.trim() {
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }

    /// Returns the storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

/// Authenticated caller, resolved from the session cookie.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CurrentUser {
    /// User row id.
    pub id: Uuid,
    /// Case-folded email.
    pub email: String,
    /// Caller role.
    pub role: Role,
}

impl CurrentUser {
    /// Owner-or-admin rule: a row owned by `owner_id` is accessible to
    /// its owner and to any admin.
    #[must_use]
    pub fn can_access_owned(&self, owner_id: Uuid) -> bool {
        self.role == Role::Admin || self.id == owner_id
    }

    /// Returns `true` for administrative accounts.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_roles_degrade_to_user() {
        assert_eq!(Role::from_str_or_user("admin"), Role::Admin);
        assert_eq!(Role::from_str_or_user("user"), Role::User);
        assert_eq!(Role::from_str_or_user(""), Role::User);
        assert_eq!(Role::from_str_or_user("superuser"), Role::User);
    }

    #[test]
    fn owner_or_admin_rule() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        let user = CurrentUser {
            id: owner,
            email: "a@example.com".to_string(),
            role: Role::User,
        };
        assert!(user.can_access_owned(owner));
        assert!(!user.can_access_owned(other));

        let admin = CurrentUser {
            id: other,
            email: "admin@example.com".to_string(),
            role: Role::Admin,
        };
        assert!(admin.can_access_owned(owner));
    }
}
