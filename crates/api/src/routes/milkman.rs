//! Milkman routes: vendor directory and vendor-initiated collection.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::routes::auth::UserResponse;
use crate::routes::payments::open_payment_order;
use crate::{AppState, middleware::AuthUser};
use milkbook_core::payment::Initiator;
use milkbook_db::repositories::user::UserRepository;
use milkbook_shared::auth::Role;

/// Creates the milkman routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/milkman/price", post(set_price))
        .route("/milkman/profile", get(profile))
        .route("/milkman/gateway-keys", post(set_gateway_keys))
        .route("/milkman/orders", post(create_order_for_customer))
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for setting the price per litre.
#[derive(Debug, Deserialize)]
pub struct SetPriceRequest {
    /// New price per litre.
    pub price_per_litre: Decimal,
}

/// Request body for setting gateway credentials. Absent fields keep their
/// current value.
#[derive(Debug, Deserialize)]
pub struct SetGatewayKeysRequest {
    /// Gateway key id.
    pub gateway_key_id: Option<String>,
    /// Gateway key secret.
    pub gateway_key_secret: Option<String>,
}

/// Request body for vendor-initiated order creation.
#[derive(Debug, Deserialize)]
pub struct CreateOrderForCustomerRequest {
    /// The customer to collect from.
    pub customer_id: Uuid,
    /// The purchases to settle.
    pub purchase_ids: Vec<Uuid>,
}

// ============================================================================
// Helpers
// ============================================================================

fn require_milkman(auth: &AuthUser) -> Result<Uuid, axum::response::Response> {
    if auth.role() == Role::Milkman {
        Ok(auth.user_id())
    } else {
        Err((
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "forbidden",
                "message": "Milkman access required"
            })),
        )
            .into_response())
    }
}

fn internal_error() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": "An error occurred"
        })),
    )
        .into_response()
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST /milkman/price - Set the price per litre.
async fn set_price(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<SetPriceRequest>,
) -> impl IntoResponse {
    let milkman_id = match require_milkman(&auth) {
        Ok(id) => id,
        Err(response) => return response,
    };

    if payload.price_per_litre <= Decimal::ZERO {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_price",
                "message": "Price per litre must be positive"
            })),
        )
            .into_response();
    }

    let user_repo = UserRepository::new((*state.db).clone());
    match user_repo.set_price(milkman_id, payload.price_per_litre).await {
        Ok(milkman) => {
            info!(milkman_id = %milkman_id, price = %payload.price_per_litre, "Price updated");
            (
                StatusCode::OK,
                Json(json!({
                    "message": "Price per litre updated successfully",
                    "price_per_litre": milkman.price_per_litre
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to update price");
            internal_error()
        }
    }
}

/// GET /milkman/profile - The milkman's profile, price, and referral code.
async fn profile(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let milkman_id = match require_milkman(&auth) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let user_repo = UserRepository::new((*state.db).clone());
    match user_repo.find_by_id(milkman_id).await {
        Ok(Some(milkman)) => (
            StatusCode::OK,
            Json(json!({ "milkman": UserResponse::from(milkman) })),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Account not found"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to load milkman profile");
            internal_error()
        }
    }
}

/// POST /milkman/gateway-keys - Set or update gateway credentials.
async fn set_gateway_keys(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<SetGatewayKeysRequest>,
) -> impl IntoResponse {
    let milkman_id = match require_milkman(&auth) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let user_repo = UserRepository::new((*state.db).clone());
    match user_repo
        .set_gateway_keys(milkman_id, payload.gateway_key_id, payload.gateway_key_secret)
        .await
    {
        Ok(milkman) => {
            info!(milkman_id = %milkman_id, "Gateway credentials updated");
            (
                StatusCode::OK,
                Json(json!({
                    "message": "Payment details saved",
                    "milkman": UserResponse::from(milkman)
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to update gateway credentials");
            internal_error()
        }
    }
}

/// POST /milkman/orders - Milkman opens a payment order for a customer.
async fn create_order_for_customer(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateOrderForCustomerRequest>,
) -> impl IntoResponse {
    let milkman_id = match require_milkman(&auth) {
        Ok(id) => id,
        Err(response) => return response,
    };

    open_payment_order(
        &state,
        Initiator::Vendor,
        payload.customer_id,
        milkman_id,
        &payload.purchase_ids,
    )
    .await
}
