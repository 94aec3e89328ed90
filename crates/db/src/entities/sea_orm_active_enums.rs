//! Postgres enum mappings.

use milkbook_shared::auth::Role;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role enum (`user_role` in Postgres).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Vendor role.
    #[sea_orm(string_value = "milkman")]
    Milkman,
    /// Customer role.
    #[sea_orm(string_value = "customer")]
    Customer,
}

impl From<Role> for UserRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Milkman => Self::Milkman,
            Role::Customer => Self::Customer,
        }
    }
}

impl From<UserRole> for Role {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Milkman => Self::Milkman,
            UserRole::Customer => Self::Customer,
        }
    }
}

/// Payment status enum (`payment_status` in Postgres).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_status")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Created, not yet confirmed.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Confirmed and settled.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Terminally failed.
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl From<milkbook_core::payment::PaymentStatus> for PaymentStatus {
    fn from(status: milkbook_core::payment::PaymentStatus) -> Self {
        match status {
            milkbook_core::payment::PaymentStatus::Pending => Self::Pending,
            milkbook_core::payment::PaymentStatus::Completed => Self::Completed,
            milkbook_core::payment::PaymentStatus::Failed => Self::Failed,
        }
    }
}

impl From<PaymentStatus> for milkbook_core::payment::PaymentStatus {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Pending => Self::Pending,
            PaymentStatus::Completed => Self::Completed,
            PaymentStatus::Failed => Self::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!(Role::from(UserRole::Milkman), Role::Milkman);
        assert_eq!(UserRole::from(Role::Customer), UserRole::Customer);
    }

    #[test]
    fn test_payment_status_round_trip() {
        use milkbook_core::payment::PaymentStatus as Core;
        for status in [Core::Pending, Core::Completed, Core::Failed] {
            assert_eq!(Core::from(PaymentStatus::from(status)), status);
        }
    }
}
