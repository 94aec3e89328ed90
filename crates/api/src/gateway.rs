//! HTTP client for the payment gateway.
//!
//! Implements the core `PaymentGateway` trait against the gateway's order
//! API: basic auth with the resolved key pair, JSON body with the amount in
//! minor units and the payment id as receipt.

use async_trait::async_trait;

use milkbook_core::payment::{GatewayError, GatewayKeys, GatewayOrder, OrderRequest, PaymentGateway};

/// Reqwest-backed gateway client.
#[derive(Debug, Clone)]
pub struct RazorpayGateway {
    http: reqwest::Client,
    api_base: String,
}

impl RazorpayGateway {
    /// Creates a client against the given API base URL.
    #[must_use]
    pub fn new(api_base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base,
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(
        &self,
        keys: &GatewayKeys,
        request: OrderRequest,
    ) -> Result<GatewayOrder, GatewayError> {
        let url = format!("{}/orders", self.api_base);

        let response = self
            .http
            .post(&url)
            .basic_auth(&keys.key_id, Some(&keys.key_secret))
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected(format!("{status}: {body}")));
        }

        response
            .json::<GatewayOrder>()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))
    }
}
