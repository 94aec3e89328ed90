//! User repository: accounts, referral binding, and the vendor directory.
//!
//! Milkman rows double as the vendor directory: the price per litre and the
//! optional gateway key pair the payment flows read.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use milkbook_shared::auth::Role;

use crate::entities::{sea_orm_active_enums::UserRole, users};

/// Error types for user operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// User not found.
    #[error("User not found: {0}")]
    NotFound(Uuid),

    /// Email is already registered.
    #[error("Email already registered: {0}")]
    EmailTaken(String),

    /// Referral code collision; caller should regenerate and retry.
    #[error("Referral code already in use")]
    ReferralCodeTaken,

    /// The account is not a milkman.
    #[error("Account {0} is not a milkman")]
    NotAMilkman(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a verified account.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Email address (unique).
    pub email: String,
    /// Argon2id password hash.
    pub password_hash: String,
    /// Account role.
    pub role: Role,
    /// Bound milkman (customers only).
    pub milkman_id: Option<Uuid>,
    /// Referral code (milkmen only).
    pub referral_code: Option<String>,
}

/// User repository for account and vendor-directory operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by email.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, UserError> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(user)
    }

    /// Finds a user by id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, UserError> {
        Ok(users::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// Finds the milkman owning a referral code.
    pub async fn find_milkman_by_referral(
        &self,
        referral_code: &str,
    ) -> Result<Option<users::Model>, UserError> {
        let milkman = users::Entity::find()
            .filter(users::Column::ReferralCode.eq(referral_code))
            .filter(users::Column::Role.eq(UserRole::Milkman))
            .one(&self.db)
            .await?;
        Ok(milkman)
    }

    /// Creates a verified account.
    ///
    /// # Errors
    ///
    /// Maps unique-constraint violations to `EmailTaken` /
    /// `ReferralCodeTaken` so callers can branch on them.
    pub async fn create(&self, input: CreateUserInput) -> Result<users::Model, UserError> {
        let now = Utc::now().into();

        let user = users::ActiveModel {
            id: Set(Uuid::now_v7()),
            email: Set(input.email.clone()),
            password_hash: Set(input.password_hash),
            role: Set(input.role.into()),
            is_verified: Set(true),
            milkman_id: Set(input.milkman_id),
            referral_code: Set(input.referral_code.clone()),
            price_per_litre: Set(None),
            gateway_key_id: Set(None),
            gateway_key_secret: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match user.insert(&self.db).await {
            Ok(model) => Ok(model),
            Err(e) => {
                if matches!(e.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_))) {
                    // Disambiguate: the email is the common case, the
                    // referral code the rare collision.
                    if self.find_by_email(&input.email).await?.is_some() {
                        return Err(UserError::EmailTaken(input.email));
                    }
                    return Err(UserError::ReferralCodeTaken);
                }
                Err(e.into())
            }
        }
    }

    /// Sets a milkman's price per litre.
    pub async fn set_price(
        &self,
        milkman_id: Uuid,
        price_per_litre: rust_decimal::Decimal,
    ) -> Result<users::Model, UserError> {
        let milkman = self.require_milkman(milkman_id).await?;

        let mut active: users::ActiveModel = milkman.into();
        active.price_per_litre = Set(Some(price_per_litre));
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Sets a milkman's gateway key pair. `None` fields keep their current
    /// value (partial update).
    pub async fn set_gateway_keys(
        &self,
        milkman_id: Uuid,
        key_id: Option<String>,
        key_secret: Option<String>,
    ) -> Result<users::Model, UserError> {
        let milkman = self.require_milkman(milkman_id).await?;

        let mut active: users::ActiveModel = milkman.into();
        if let Some(id) = key_id {
            active.gateway_key_id = Set(Some(id));
        }
        if let Some(secret) = key_secret {
            active.gateway_key_secret = Set(Some(secret));
        }
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Vendor directory: the milkman's current price per litre.
    pub async fn price_of(&self, milkman_id: Uuid) -> Result<Option<rust_decimal::Decimal>, UserError> {
        let milkman = self.require_milkman(milkman_id).await?;
        Ok(milkman.price_per_litre)
    }

    /// Vendor directory: the milkman's own gateway key pair, if fully
    /// configured.
    pub async fn gateway_keys_of(
        &self,
        milkman_id: Uuid,
    ) -> Result<Option<(String, String)>, UserError> {
        let milkman = self.require_milkman(milkman_id).await?;
        Ok(milkman.gateway_key_id.zip(milkman.gateway_key_secret))
    }

    async fn require_milkman(&self, milkman_id: Uuid) -> Result<users::Model, UserError> {
        let user = self
            .find_by_id(milkman_id)
            .await?
            .ok_or(UserError::NotFound(milkman_id))?;
        if user.role != UserRole::Milkman {
            return Err(UserError::NotAMilkman(milkman_id));
        }
        Ok(user)
    }
}
