//! Purchase ledger error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during purchase ledger operations.
#[derive(Debug, Error)]
pub enum PurchaseError {
    // ========== Validation Errors ==========
    /// Quantity must be a positive number of litres.
    #[error("Quantity must be positive")]
    NonPositiveQuantity,

    /// Billing cycle must be 15 or 30 days.
    #[error("Invalid billing cycle: {0} days (must be 15 or 30)")]
    InvalidBillingCycle(u16),

    // ========== Configuration Errors ==========
    /// The milkman has not configured a price per litre.
    #[error("Milkman {0} has no price per litre configured")]
    PriceNotConfigured(Uuid),

    // ========== State Errors ==========
    /// Purchase entry not found.
    #[error("Purchase not found: {0}")]
    NotFound(Uuid),

    /// The entry is referenced by a pending payment and cannot be edited.
    #[error("Purchase {0} is referenced by a pending payment")]
    LockedByPendingPayment(Uuid),

    // ========== Concurrency Errors ==========
    /// Concurrent modification detected.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl PurchaseError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveQuantity => "NON_POSITIVE_QUANTITY",
            Self::InvalidBillingCycle(_) => "INVALID_BILLING_CYCLE",
            Self::PriceNotConfigured(_) => "PRICE_NOT_CONFIGURED",
            Self::NotFound(_) => "PURCHASE_NOT_FOUND",
            Self::LockedByPendingPayment(_) => "LOCKED_BY_PENDING_PAYMENT",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NonPositiveQuantity
            | Self::InvalidBillingCycle(_)
            | Self::PriceNotConfigured(_) => 400,
            Self::NotFound(_) => 404,
            Self::LockedByPendingPayment(_) | Self::ConcurrentModification => 409,
            Self::Database(_) => 500,
        }
    }

    /// Returns true if the caller may retry the operation as-is.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConcurrentModification | Self::LockedByPendingPayment(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            PurchaseError::NonPositiveQuantity.error_code(),
            "NON_POSITIVE_QUANTITY"
        );
        assert_eq!(
            PurchaseError::InvalidBillingCycle(7).error_code(),
            "INVALID_BILLING_CYCLE"
        );
        assert_eq!(
            PurchaseError::PriceNotConfigured(Uuid::nil()).error_code(),
            "PRICE_NOT_CONFIGURED"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(PurchaseError::NonPositiveQuantity.http_status_code(), 400);
        assert_eq!(
            PurchaseError::NotFound(Uuid::nil()).http_status_code(),
            404
        );
        assert_eq!(
            PurchaseError::LockedByPendingPayment(Uuid::nil()).http_status_code(),
            409
        );
        assert_eq!(
            PurchaseError::Database("boom".into()).http_status_code(),
            500
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(PurchaseError::ConcurrentModification.is_retryable());
        assert!(PurchaseError::LockedByPendingPayment(Uuid::nil()).is_retryable());
        assert!(!PurchaseError::NonPositiveQuantity.is_retryable());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            PurchaseError::InvalidBillingCycle(7).to_string(),
            "Invalid billing cycle: 7 days (must be 15 or 30)"
        );
    }
}
