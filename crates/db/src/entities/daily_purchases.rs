//! `SeaORM` Entity for the daily purchase ledger.
//!
//! At most one row per (customer, milkman, entry_date); the compound unique
//! index backs the upsert.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "daily_purchases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub milkman_id: Uuid,
    pub litres: Decimal,
    /// Price snapshotted at record time; later price changes do not touch
    /// existing rows.
    pub price_per_litre: Decimal,
    pub total_amount: Decimal,
    pub billing_cycle_days: i16,
    pub entry_date: Date,
    pub due_date: Date,
    pub is_paid: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CustomerId",
        to = "super::users::Column::Id"
    )]
    Customer,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::MilkmanId",
        to = "super::users::Column::Id"
    )]
    Milkman,
}

impl ActiveModelBehavior for ActiveModel {}
