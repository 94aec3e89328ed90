//! `SeaORM` Entity for payments.
//!
//! `amount` is frozen at creation; `status` only moves forward and is
//! written exclusively by the reconciler.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::PaymentStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub milkman_id: Uuid,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,
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
    #[sea_orm(has_many = "super::payment_purchases::Entity")]
    PaymentPurchases,
}

impl Related<super::payment_purchases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentPurchases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
