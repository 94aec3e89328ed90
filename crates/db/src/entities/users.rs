//! `SeaORM` Entity for the accounts table.
//!
//! A single table holds both roles; customer rows carry the milkman they are
//! bound to, milkman rows carry pricing and optional gateway credentials.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::UserRole;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub email: String,
    /// Argon2id PHC string. Never serialized into API responses.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub is_verified: bool,
    /// Customer-to-vendor binding; null for milkmen.
    pub milkman_id: Option<Uuid>,
    /// Signup code handed out by milkmen; null for customers.
    pub referral_code: Option<String>,
    /// Current price per litre; only meaningful for milkmen.
    pub price_per_litre: Option<Decimal>,
    pub gateway_key_id: Option<String>,
    /// Gateway signing secret. Never serialized into API responses.
    #[serde(skip_serializing)]
    pub gateway_key_secret: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
