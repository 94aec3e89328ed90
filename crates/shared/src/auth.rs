//! Authentication types: roles, JWT claims, and token payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role.
///
/// A closed variant, never a free-form string: every capability check in the
/// API branches on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A vendor delivering goods and collecting payments.
    Milkman,
    /// A customer bound to exactly one milkman.
    Customer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Milkman => write!(f, "milkman"),
            Self::Customer => write!(f, "customer"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "milkman" => Ok(Self::Milkman),
            "customer" => Ok(Self::Customer),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account ID).
    pub sub: Uuid,
    /// Account role.
    pub role: Role,
    /// Linked milkman ID (present for customers, absent for milkmen).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milkman_id: Option<Uuid>,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for an account.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        role: Role,
        milkman_id: Option<Uuid>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            role,
            milkman_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the account ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_role_round_trip() {
        assert_eq!(Role::from_str("milkman").unwrap(), Role::Milkman);
        assert_eq!(Role::from_str("customer").unwrap(), Role::Customer);
        assert_eq!(Role::Milkman.to_string(), "milkman");
        assert_eq!(Role::Customer.to_string(), "customer");
        assert!(Role::from_str("admin").is_err());
        assert!(Role::from_str("").is_err());
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Milkman).unwrap(), "\"milkman\"");
        let parsed: Role = serde_json::from_str("\"customer\"").unwrap();
        assert_eq!(parsed, Role::Customer);
    }

    #[test]
    fn test_claims_carry_milkman_binding() {
        let user = Uuid::new_v4();
        let milkman = Uuid::new_v4();
        let claims = Claims::new(
            user,
            Role::Customer,
            Some(milkman),
            Utc::now() + chrono::Duration::days(7),
        );

        assert_eq!(claims.user_id(), user);
        assert_eq!(claims.role, Role::Customer);
        assert_eq!(claims.milkman_id, Some(milkman));
        assert!(claims.exp > claims.iat);
    }
}
