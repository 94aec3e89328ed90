//! Signup verification codes.
//!
//! One active code per email, sha256-hashed at rest, 10-minute TTL,
//! single-use. Issuing a new code replaces any previous one atomically.

use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::entities::verification_codes;

/// Code validity window.
const CODE_TTL_MINUTES: i64 = 10;

/// Error types for verification-code operations.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    /// No code has been issued for this email, or it was already used.
    #[error("No active verification code for {0}")]
    NotFound(String),

    /// The code expired; a new one must be requested.
    #[error("Verification code expired")]
    Expired,

    /// The supplied code does not match.
    #[error("Invalid verification code")]
    Mismatch,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Verification-code repository.
#[derive(Debug, Clone)]
pub struct VerificationRepository {
    db: DatabaseConnection,
}

fn hash_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

impl VerificationRepository {
    /// Creates a new verification repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Issues a code for an email, replacing any previous code.
    pub async fn issue(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<(), VerificationError> {
        let record = verification_codes::ActiveModel {
            id: Set(Uuid::now_v7()),
            email: Set(email.to_string()),
            code_hash: Set(hash_code(code)),
            expires_at: Set((now + Duration::minutes(CODE_TTL_MINUTES)).into()),
            consumed_at: Set(None),
            created_at: Set(now.into()),
        };

        verification_codes::Entity::insert(record)
            .on_conflict(
                OnConflict::column(verification_codes::Column::Email)
                    .update_columns([
                        verification_codes::Column::CodeHash,
                        verification_codes::Column::ExpiresAt,
                        verification_codes::Column::ConsumedAt,
                        verification_codes::Column::CreatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        Ok(())
    }

    /// Consumes a code: checks existence, expiry, and the code itself, then
    /// marks it used so it cannot be replayed.
    pub async fn consume(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<(), VerificationError> {
        let record = verification_codes::Entity::find()
            .filter(verification_codes::Column::Email.eq(email))
            .filter(verification_codes::Column::ConsumedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or_else(|| VerificationError::NotFound(email.to_string()))?;

        if now > record.expires_at.with_timezone(&Utc) {
            return Err(VerificationError::Expired);
        }

        if record.code_hash != hash_code(code) {
            return Err(VerificationError::Mismatch);
        }

        let mut active: verification_codes::ActiveModel = record.into();
        active.consumed_at = Set(Some(now.into()));
        active.update(&self.db).await?;

        Ok(())
    }
}
