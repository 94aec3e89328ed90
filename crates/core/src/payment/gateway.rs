//! Payment gateway contract.
//!
//! The wire format follows the gateway's order API: integer minor units,
//! INR, the payment id as receipt, and immediate capture.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::GatewayKeys;

/// An order-creation request as sent to the gateway.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OrderRequest {
    /// Amount in minor units (paise).
    pub amount: i64,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Our payment id, echoed back by the gateway. Doubles as the
    /// idempotency token for order-opening retries.
    pub receipt: String,
    /// Capture immediately on authorization.
    pub payment_capture: u8,
}

impl OrderRequest {
    /// Builds an order request for a payment.
    #[must_use]
    pub fn new(amount_paise: i64, receipt: String) -> Self {
        Self {
            amount: amount_paise,
            currency: milkbook_shared::types::money::CURRENCY.to_string(),
            receipt,
            payment_capture: 1,
        }
    }
}

/// A remote order as returned by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayOrder {
    /// Gateway-side order id.
    pub id: String,
    /// Echoed amount in minor units.
    pub amount: i64,
    /// Echoed currency.
    pub currency: String,
    /// Echoed receipt (our payment id).
    pub receipt: Option<String>,
}

/// Errors from the gateway client.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway could not be reached.
    #[error("gateway unreachable: {0}")]
    Unreachable(String),

    /// The gateway answered with an error status.
    #[error("gateway rejected the request: {0}")]
    Rejected(String),

    /// The gateway's response could not be decoded.
    #[error("malformed gateway response: {0}")]
    MalformedResponse(String),
}

/// Client-side seam to the payment gateway.
///
/// The HTTP implementation lives in the API crate; tests use a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a remote order with the given credentials.
    async fn create_order(
        &self,
        keys: &GatewayKeys,
        request: OrderRequest,
    ) -> Result<GatewayOrder, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_request_wire_shape() {
        let request = OrderRequest::new(42_500, "pay-123".to_string());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "amount": 42_500,
                "currency": "INR",
                "receipt": "pay-123",
                "payment_capture": 1
            })
        );
    }

    #[tokio::test]
    async fn test_mock_gateway_round_trip() {
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_order().returning(|_, request| {
            Ok(GatewayOrder {
                id: "order_abc".to_string(),
                amount: request.amount,
                currency: request.currency,
                receipt: Some(request.receipt),
            })
        });

        let keys = GatewayKeys {
            key_id: "rzp_test".to_string(),
            key_secret: "secret".to_string(),
        };
        let order = gateway
            .create_order(&keys, OrderRequest::new(1_000, "p1".to_string()))
            .await
            .unwrap();

        assert_eq!(order.id, "order_abc");
        assert_eq!(order.amount, 1_000);
        assert_eq!(order.receipt.as_deref(), Some("p1"));
    }
}
