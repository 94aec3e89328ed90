//! Payment domain types.

use serde::{Deserialize, Serialize};

/// Payment status.
///
/// Transitions only move forward: `pending -> completed` or
/// `pending -> failed`. Both end states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Created, not yet confirmed by the gateway.
    Pending,
    /// Confirmed; referenced entries are settled.
    Completed,
    /// Terminally failed.
    Failed,
}

impl PaymentStatus {
    /// Returns true if the payment can still change state.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns true if the payment has reached an end state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Who initiated an order-creation request.
///
/// The two entry points carry different gateway-configuration policies: a
/// milkman may create a payment record before wiring up gateway keys and
/// open the remote order later; a customer checkout needs a payable order
/// immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Initiator {
    /// Customer checkout flow.
    Customer,
    /// Milkman collecting on a customer's behalf.
    Vendor,
}

impl Initiator {
    /// Returns true if order creation may proceed without resolvable
    /// gateway credentials (payment stays pending with no remote order).
    #[must_use]
    pub const fn allows_unconfigured_gateway(self) -> bool {
        matches!(self, Self::Vendor)
    }
}

/// A resolved gateway key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayKeys {
    /// Public key id sent to the gateway and to clients.
    pub key_id: String,
    /// Signing/auth secret. Never serialized, never logged.
    pub key_secret: String,
}

impl GatewayKeys {
    /// Resolves the effective key pair for a milkman: their own pair when
    /// fully configured, else the process-wide default pair.
    #[must_use]
    pub fn resolve(
        milkman_keys: Option<(String, String)>,
        default_keys: Option<(String, String)>,
    ) -> Option<Self> {
        milkman_keys
            .or(default_keys)
            .map(|(key_id, key_secret)| Self { key_id, key_secret })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_openness() {
        assert!(PaymentStatus::Pending.is_open());
        assert!(!PaymentStatus::Completed.is_open());
        assert!(!PaymentStatus::Failed.is_open());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(PaymentStatus::Completed.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Pending).unwrap(),
            "\"pending\""
        );
        let parsed: PaymentStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(parsed, PaymentStatus::Completed);
    }

    #[test]
    fn test_initiator_gateway_policy() {
        assert!(Initiator::Vendor.allows_unconfigured_gateway());
        assert!(!Initiator::Customer.allows_unconfigured_gateway());
    }

    #[test]
    fn test_key_resolution_prefers_milkman_keys() {
        let keys = GatewayKeys::resolve(
            Some(("rzp_milkman".into(), "s1".into())),
            Some(("rzp_default".into(), "s2".into())),
        )
        .unwrap();
        assert_eq!(keys.key_id, "rzp_milkman");
        assert_eq!(keys.key_secret, "s1");
    }

    #[test]
    fn test_key_resolution_falls_back_to_default() {
        let keys = GatewayKeys::resolve(None, Some(("rzp_default".into(), "s2".into()))).unwrap();
        assert_eq!(keys.key_id, "rzp_default");
    }

    #[test]
    fn test_key_resolution_none_when_unconfigured() {
        assert_eq!(GatewayKeys::resolve(None, None), None);
    }
}
