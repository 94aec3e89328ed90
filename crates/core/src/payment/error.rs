//! Payment error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    // ========== Validation Errors ==========
    /// The request named no purchase entries.
    #[error("At least one purchase must be selected")]
    EmptySelection,

    /// None of the requested entries are billable (already paid, already
    /// referenced by a pending payment, or not owned by this pair).
    #[error("No billable purchases in the selection")]
    NoEligibleEntries,

    /// The payment amount does not fit the gateway's integer minor units.
    #[error("Amount cannot be represented in minor units")]
    UnrepresentableAmount,

    // ========== Configuration Errors ==========
    /// Neither the milkman nor the process has gateway credentials.
    #[error("Payment gateway is not configured for milkman {0}")]
    GatewayNotConfigured(Uuid),

    // ========== Verification Errors ==========
    /// The supplied signature does not match. Deliberately carries no
    /// detail: neither the secret nor the computed digest ever leaves the
    /// reconciler.
    #[error("Payment verification failed")]
    VerificationFailed,

    // ========== State Errors ==========
    /// Payment not found.
    #[error("Payment not found: {0}")]
    NotFound(Uuid),

    /// The payment already reached a terminal state and cannot transition.
    #[error("Payment {0} is already settled")]
    AlreadySettled(Uuid),

    // ========== Concurrency Errors ==========
    /// Concurrent modification detected.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    // ========== External Errors ==========
    /// The gateway rejected or failed the remote call. The payment record
    /// stays pending and retryable.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl PaymentError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::EmptySelection => "EMPTY_SELECTION",
            Self::NoEligibleEntries => "NO_ELIGIBLE_ENTRIES",
            Self::UnrepresentableAmount => "UNREPRESENTABLE_AMOUNT",
            Self::GatewayNotConfigured(_) => "GATEWAY_NOT_CONFIGURED",
            Self::VerificationFailed => "VERIFICATION_FAILED",
            Self::NotFound(_) => "PAYMENT_NOT_FOUND",
            Self::AlreadySettled(_) => "PAYMENT_ALREADY_SETTLED",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Gateway(_) => "GATEWAY_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::EmptySelection
            | Self::NoEligibleEntries
            | Self::UnrepresentableAmount
            | Self::GatewayNotConfigured(_)
            | Self::VerificationFailed => 400,
            Self::NotFound(_) => 404,
            Self::AlreadySettled(_) | Self::ConcurrentModification => 409,
            Self::Gateway(_) | Self::Database(_) => 500,
        }
    }

    /// Returns true if the caller may retry the operation as-is.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification | Self::Gateway(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            PaymentError::NoEligibleEntries.error_code(),
            "NO_ELIGIBLE_ENTRIES"
        );
        assert_eq!(
            PaymentError::VerificationFailed.error_code(),
            "VERIFICATION_FAILED"
        );
        assert_eq!(
            PaymentError::GatewayNotConfigured(Uuid::nil()).error_code(),
            "GATEWAY_NOT_CONFIGURED"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(PaymentError::EmptySelection.http_status_code(), 400);
        assert_eq!(PaymentError::VerificationFailed.http_status_code(), 400);
        assert_eq!(PaymentError::NotFound(Uuid::nil()).http_status_code(), 404);
        assert_eq!(
            PaymentError::AlreadySettled(Uuid::nil()).http_status_code(),
            409
        );
        assert_eq!(PaymentError::Gateway("down".into()).http_status_code(), 500);
    }

    #[test]
    fn test_verification_error_leaks_nothing() {
        // The Display output must stay generic whatever happened inside.
        assert_eq!(
            PaymentError::VerificationFailed.to_string(),
            "Payment verification failed"
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(PaymentError::ConcurrentModification.is_retryable());
        assert!(PaymentError::Gateway("timeout".into()).is_retryable());
        assert!(!PaymentError::VerificationFailed.is_retryable());
        assert!(!PaymentError::NoEligibleEntries.is_retryable());
    }
}
