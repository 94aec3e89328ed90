//! `SeaORM` entity definitions.

pub mod daily_purchases;
pub mod payment_purchases;
pub mod payments;
pub mod sea_orm_active_enums;
pub mod users;
pub mod verification_codes;
