//! Gateway callback verification.
//!
//! The gateway signs `"{order_id}|{payment_id}"` with HMAC-SHA256 using the
//! key secret and sends the hex digest back. Verification recomputes the MAC
//! and compares in constant time; the computed digest never leaves this
//! module.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::error::PaymentError;
use super::types::PaymentStatus;

type HmacSha256 = Hmac<Sha256>;

/// Remote identifiers attached to a gateway confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfirmation {
    /// Gateway order id.
    pub order_id: String,
    /// Gateway payment id.
    pub payment_id: String,
    /// Hex-encoded HMAC-SHA256 signature.
    pub signature: String,
}

/// Outcome of planning a verification against the current payment state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The payment is pending and the signature matched: transition to
    /// completed and mark every referenced entry paid, atomically.
    Complete,
    /// The payment is already completed with the same remote ids: return it
    /// unchanged. Duplicate webhooks and client retries land here.
    AlreadyCompleted,
}

/// Verifies a gateway signature over the canonical `order_id|payment_id`
/// string.
///
/// The comparison is constant-time (`Mac::verify_slice`); a syntactically
/// invalid hex signature fails like any other mismatch.
///
/// # Errors
///
/// Returns `PaymentError::VerificationFailed` on any mismatch.
pub fn verify_signature(
    order_id: &str,
    payment_id: &str,
    secret: &str,
    supplied_signature: &str,
) -> Result<(), PaymentError> {
    let supplied =
        hex::decode(supplied_signature).map_err(|_| PaymentError::VerificationFailed)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| PaymentError::VerificationFailed)?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());

    mac.verify_slice(&supplied)
        .map_err(|_| PaymentError::VerificationFailed)
}

/// Decides how a verification request applies to a payment.
///
/// State machine: `pending --valid--> completed`; an invalid signature
/// leaves the payment pending and fails; `completed` is terminal and
/// re-verification with the stored remote ids is the idempotent success
/// path.
///
/// # Errors
///
/// - `VerificationFailed` for a bad signature, or for remote ids that do
///   not match a completed payment's stored ids
/// - `AlreadySettled` when the payment terminally failed
pub fn plan_verification(
    status: PaymentStatus,
    stored_order_id: Option<&str>,
    stored_payment_id: Option<&str>,
    confirmation: &RemoteConfirmation,
    secret: &str,
    payment_id: uuid::Uuid,
) -> Result<VerificationOutcome, PaymentError> {
    match status {
        PaymentStatus::Pending => {
            verify_signature(
                &confirmation.order_id,
                &confirmation.payment_id,
                secret,
                &confirmation.signature,
            )?;
            Ok(VerificationOutcome::Complete)
        }
        PaymentStatus::Completed => {
            let ids_match = stored_order_id == Some(confirmation.order_id.as_str())
                && stored_payment_id == Some(confirmation.payment_id.as_str());
            if ids_match {
                Ok(VerificationOutcome::AlreadyCompleted)
            } else {
                Err(PaymentError::VerificationFailed)
            }
        }
        PaymentStatus::Failed => Err(PaymentError::AlreadySettled(payment_id)),
    }
}

/// Computes the hex signature a gateway would send. Test-side counterpart of
/// `verify_signature`.
#[cfg(test)]
pub fn sign(order_id: &str, payment_id: &str, secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const SECRET: &str = "rzp_secret_for_tests";

    fn confirmation(order_id: &str, payment_id: &str, signature: String) -> RemoteConfirmation {
        RemoteConfirmation {
            order_id: order_id.to_string(),
            payment_id: payment_id.to_string(),
            signature,
        }
    }

    #[test]
    fn test_valid_signature_accepted() {
        let sig = sign("order_1", "pay_1", SECRET);
        assert!(verify_signature("order_1", "pay_1", SECRET, &sig).is_ok());
    }

    #[test]
    fn test_tampered_ids_rejected() {
        let sig = sign("order_1", "pay_1", SECRET);
        assert!(verify_signature("order_2", "pay_1", SECRET, &sig).is_err());
        assert!(verify_signature("order_1", "pay_2", SECRET, &sig).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let sig = sign("order_1", "pay_1", "someone-elses-secret");
        assert!(verify_signature("order_1", "pay_1", SECRET, &sig).is_err());
    }

    #[test]
    fn test_non_hex_signature_rejected() {
        assert!(matches!(
            verify_signature("order_1", "pay_1", SECRET, "not hex!"),
            Err(PaymentError::VerificationFailed)
        ));
    }

    #[test]
    fn test_truncated_signature_rejected() {
        let sig = sign("order_1", "pay_1", SECRET);
        assert!(verify_signature("order_1", "pay_1", SECRET, &sig[..32]).is_err());
    }

    #[test]
    fn test_separator_is_part_of_the_canonical_string() {
        // "ab|c" and "a|bc" must not collide.
        let sig = sign("ab", "c", SECRET);
        assert!(verify_signature("a", "bc", SECRET, &sig).is_err());
    }

    #[test]
    fn test_pending_with_valid_signature_completes() {
        let sig = sign("order_1", "pay_1", SECRET);
        let outcome = plan_verification(
            PaymentStatus::Pending,
            Some("order_1"),
            None,
            &confirmation("order_1", "pay_1", sig),
            SECRET,
            Uuid::new_v4(),
        )
        .unwrap();
        assert_eq!(outcome, VerificationOutcome::Complete);
    }

    #[test]
    fn test_pending_with_invalid_signature_stays_pending() {
        let result = plan_verification(
            PaymentStatus::Pending,
            Some("order_1"),
            None,
            &confirmation("order_1", "pay_1", sign("order_1", "pay_1", "bad")),
            SECRET,
            Uuid::new_v4(),
        );
        // No outcome is produced, so the caller persists nothing.
        assert!(matches!(result, Err(PaymentError::VerificationFailed)));
    }

    #[test]
    fn test_retry_after_failure_with_correct_signature_succeeds() {
        let bad = plan_verification(
            PaymentStatus::Pending,
            Some("order_1"),
            None,
            &confirmation("order_1", "pay_1", "deadbeef".to_string()),
            SECRET,
            Uuid::new_v4(),
        );
        assert!(bad.is_err());

        let good = plan_verification(
            PaymentStatus::Pending,
            Some("order_1"),
            None,
            &confirmation("order_1", "pay_1", sign("order_1", "pay_1", SECRET)),
            SECRET,
            Uuid::new_v4(),
        );
        assert_eq!(good.unwrap(), VerificationOutcome::Complete);
    }

    #[test]
    fn test_completed_with_matching_ids_is_idempotent() {
        let outcome = plan_verification(
            PaymentStatus::Completed,
            Some("order_1"),
            Some("pay_1"),
            &confirmation("order_1", "pay_1", sign("order_1", "pay_1", SECRET)),
            SECRET,
            Uuid::new_v4(),
        )
        .unwrap();
        assert_eq!(outcome, VerificationOutcome::AlreadyCompleted);
    }

    #[test]
    fn test_completed_with_different_ids_rejected() {
        let result = plan_verification(
            PaymentStatus::Completed,
            Some("order_1"),
            Some("pay_1"),
            &confirmation("order_9", "pay_9", sign("order_9", "pay_9", SECRET)),
            SECRET,
            Uuid::new_v4(),
        );
        assert!(matches!(result, Err(PaymentError::VerificationFailed)));
    }

    #[test]
    fn test_failed_payment_cannot_be_verified() {
        let id = Uuid::new_v4();
        let result = plan_verification(
            PaymentStatus::Failed,
            None,
            None,
            &confirmation("order_1", "pay_1", sign("order_1", "pay_1", SECRET)),
            SECRET,
            id,
        );
        assert!(matches!(
            result,
            Err(PaymentError::AlreadySettled(got)) if got == id
        ));
    }
}
