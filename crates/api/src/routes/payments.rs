//! Payment routes: order creation, verification, and history.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use milkbook_core::payment::{
    GatewayKeys, Initiator, OrderRequest, PaymentError, RemoteConfirmation, VerificationOutcome,
    plan_verification,
};
use milkbook_db::repositories::payment::PaymentRepository;
use milkbook_db::repositories::user::UserRepository;
use milkbook_shared::auth::Role;

/// Creates the payment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payments/orders", post(create_order))
        .route("/payments/verify", post(verify_payment))
        .route("/payments/history", get(payment_history))
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for customer-initiated order creation.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// The purchases to settle.
    pub purchase_ids: Vec<Uuid>,
}

/// Request body for payment verification.
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    /// Our payment id.
    pub payment_id: Uuid,
    /// Gateway order id.
    pub gateway_order_id: String,
    /// Gateway payment id.
    pub gateway_payment_id: String,
    /// Hex HMAC-SHA256 signature over `order_id|payment_id`.
    pub gateway_signature: String,
}

// ============================================================================
// Helpers
// ============================================================================

fn payment_error(e: &PaymentError) -> axum::response::Response {
    let status = StatusCode::from_u16(e.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(error = %e, "Payment operation failed");
        return (
            status,
            Json(json!({
                "error": "internal_error",
                "message": "An error occurred"
            })),
        )
            .into_response();
    }
    (
        status,
        Json(json!({
            "error": e.error_code(),
            "message": e.to_string(),
            "retryable": e.is_retryable()
        })),
    )
        .into_response()
}

/// Shared order-creation flow for both entry points.
///
/// Customer-initiated creation requires resolvable gateway credentials
/// before anything is persisted; vendor-initiated creation tolerates a
/// missing configuration and leaves the payment pending with no remote
/// order. A gateway failure after the payment row exists is not an error:
/// the pending payment is returned and order-opening can be retried with
/// the payment id as the idempotent receipt.
pub(crate) async fn open_payment_order(
    state: &AppState,
    initiator: Initiator,
    customer_id: Uuid,
    milkman_id: Uuid,
    purchase_ids: &[Uuid],
) -> axum::response::Response {
    if purchase_ids.is_empty() {
        return payment_error(&PaymentError::EmptySelection);
    }

    let user_repo = UserRepository::new((*state.db).clone());
    let milkman_keys = match user_repo.gateway_keys_of(milkman_id).await {
        Ok(keys) => keys,
        Err(e) => {
            error!(error = %e, "Failed to resolve gateway keys");
            return payment_error(&PaymentError::Database(e.to_string()));
        }
    };
    let keys = GatewayKeys::resolve(milkman_keys, state.default_gateway_keys());

    if keys.is_none() && !initiator.allows_unconfigured_gateway() {
        return payment_error(&PaymentError::GatewayNotConfigured(milkman_id));
    }

    let payment_repo = PaymentRepository::new((*state.db).clone());
    let (payment, selection) = match payment_repo
        .create_with_references(customer_id, milkman_id, purchase_ids)
        .await
    {
        Ok(created) => created,
        Err(e) => return payment_error(&e),
    };

    info!(
        payment_id = %payment.id,
        amount = %selection.amount,
        purchase_count = selection.entries.len(),
        "Payment created"
    );

    let Some(keys) = keys else {
        return (
            StatusCode::CREATED,
            Json(json!({
                "message": "Payment record created (gateway not configured)",
                "payment_id": payment.id,
                "amount": selection.amount,
                "purchase_count": selection.entries.len()
            })),
        )
            .into_response();
    };

    let request = OrderRequest::new(selection.amount_paise, payment.id.to_string());
    match state.gateway.create_order(&keys, request).await {
        Ok(order) => {
            let payment = match payment_repo.record_gateway_order(payment.id, &order.id).await {
                Ok(payment) => payment,
                Err(e) => return payment_error(&e),
            };

            info!(payment_id = %payment.id, order_id = %order.id, "Gateway order opened");
            (
                StatusCode::CREATED,
                Json(json!({
                    "message": "Payment order created",
                    "payment_id": payment.id,
                    "amount": selection.amount,
                    "purchase_count": selection.entries.len(),
                    "order": {
                        "id": order.id,
                        "amount": order.amount,
                        "currency": order.currency
                    },
                    "key_id": keys.key_id
                })),
            )
                .into_response()
        }
        Err(e) => {
            // The pending payment stays usable; the caller retries
            // order-opening against the same payment id.
            warn!(payment_id = %payment.id, error = %e, "Gateway order creation failed");
            (
                StatusCode::CREATED,
                Json(json!({
                    "message": "Payment record created; gateway order pending retry",
                    "payment_id": payment.id,
                    "amount": selection.amount,
                    "purchase_count": selection.entries.len()
                })),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST /payments/orders - Customer opens a payment order.
async fn create_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> impl IntoResponse {
    if auth.role() != Role::Customer {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "forbidden",
                "message": "Only customers create checkout orders"
            })),
        )
            .into_response();
    }
    let Some(milkman_id) = auth.milkman_id() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "not_linked",
                "message": "Customer is not linked to a milkman"
            })),
        )
            .into_response();
    };

    open_payment_order(
        &state,
        Initiator::Customer,
        auth.user_id(),
        milkman_id,
        &payload.purchase_ids,
    )
    .await
}

/// POST /payments/verify - Verify a gateway confirmation.
async fn verify_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<VerifyPaymentRequest>,
) -> impl IntoResponse {
    let payment_repo = PaymentRepository::new((*state.db).clone());

    let payment = match payment_repo.find_by_id(payload.payment_id).await {
        Ok(Some(payment)) => payment,
        Ok(None) => return payment_error(&PaymentError::NotFound(payload.payment_id)),
        Err(e) => return payment_error(&e),
    };

    // Only the two parties to the payment may submit a confirmation.
    if auth.user_id() != payment.customer_id && auth.user_id() != payment.milkman_id {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "forbidden",
                "message": "Not a party to this payment"
            })),
        )
            .into_response();
    }

    let user_repo = UserRepository::new((*state.db).clone());
    let milkman_keys = match user_repo.gateway_keys_of(payment.milkman_id).await {
        Ok(keys) => keys,
        Err(e) => {
            error!(error = %e, "Failed to resolve verification secret");
            return payment_error(&PaymentError::Database(e.to_string()));
        }
    };
    let Some(keys) = GatewayKeys::resolve(milkman_keys, state.default_gateway_keys()) else {
        return payment_error(&PaymentError::GatewayNotConfigured(payment.milkman_id));
    };

    let confirmation = RemoteConfirmation {
        order_id: payload.gateway_order_id,
        payment_id: payload.gateway_payment_id,
        signature: payload.gateway_signature,
    };

    let outcome = plan_verification(
        payment.status.clone().into(),
        payment.gateway_order_id.as_deref(),
        payment.gateway_payment_id.as_deref(),
        &confirmation,
        &keys.key_secret,
        payment.id,
    );

    match outcome {
        Ok(VerificationOutcome::AlreadyCompleted) => {
            // Duplicate webhook or client retry: no state change.
            (
                StatusCode::OK,
                Json(json!({
                    "message": "Payment already verified",
                    "payment": payment
                })),
            )
                .into_response()
        }
        Ok(VerificationOutcome::Complete) => {
            match payment_repo.complete(payment.id, &confirmation).await {
                Ok(payment) => {
                    info!(payment_id = %payment.id, "Payment verified and settled");
                    (
                        StatusCode::OK,
                        Json(json!({
                            "message": "Payment verified successfully",
                            "payment": payment
                        })),
                    )
                        .into_response()
                }
                Err(e) => payment_error(&e),
            }
        }
        Err(e) => {
            warn!(payment_id = %payment.id, "Payment verification rejected");
            payment_error(&e)
        }
    }
}

/// GET /payments/history - The customer's payments, newest first.
async fn payment_history(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    if auth.role() != Role::Customer {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "forbidden",
                "message": "Only customers have a payment history"
            })),
        )
            .into_response();
    }

    let payment_repo = PaymentRepository::new((*state.db).clone());
    let payments = match payment_repo.history_for_customer(auth.user_id()).await {
        Ok(payments) => payments,
        Err(e) => return payment_error(&e),
    };

    let mut items = Vec::with_capacity(payments.len());
    for payment in payments {
        let purchase_ids = match payment_repo.referenced_purchase_ids(payment.id).await {
            Ok(ids) => ids,
            Err(e) => return payment_error(&e),
        };
        items.push(json!({
            "payment": payment,
            "purchase_ids": purchase_ids
        }));
    }

    (StatusCode::OK, Json(json!({ "payments": items }))).into_response()
}
