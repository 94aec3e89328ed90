//! Purchase ledger routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use milkbook_core::purchase::{
    PurchaseError, PurchaseService, RecordPurchaseInput, balance,
};
use milkbook_db::repositories::purchase::{PurchaseRepository, to_ledger_entry};
use milkbook_db::repositories::user::UserRepository;
use milkbook_shared::auth::Role;

/// Creates the purchase routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/purchases", post(record_purchase))
        .route("/purchases/mine", get(customer_ledger))
        .route("/purchases/customers", get(milkman_ledger_by_customer))
        .route("/purchases/{purchase_id}/mark-paid", post(mark_paid))
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for recording a daily purchase.
#[derive(Debug, Deserialize)]
pub struct RecordPurchaseRequest {
    /// Delivered quantity in litres.
    pub litres: Decimal,
    /// Entry date (YYYY-MM-DD); defaults to today.
    pub date: Option<NaiveDate>,
    /// Billing cycle length in days (15 or 30); defaults to 15.
    pub billing_cycle_days: Option<u16>,
}

// ============================================================================
// Helpers
// ============================================================================

fn purchase_error(e: &PurchaseError) -> axum::response::Response {
    let status = StatusCode::from_u16(e.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(error = %e, "Purchase operation failed");
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

fn forbidden(message: &str) -> axum::response::Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "forbidden", "message": message })),
    )
        .into_response()
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST /purchases - Record (or re-record) a day's purchase.
async fn record_purchase(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<RecordPurchaseRequest>,
) -> impl IntoResponse {
    if auth.role() != Role::Customer {
        return forbidden("Only customers record purchases");
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

    // Resolve the milkman's current price before handing off to the pure
    // pricing logic.
    let user_repo = UserRepository::new((*state.db).clone());
    let price = match user_repo.price_of(milkman_id).await {
        Ok(price) => price,
        Err(e) => {
            error!(error = %e, "Failed to resolve milkman price");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred"
                })),
            )
                .into_response();
        }
    };

    let input = RecordPurchaseInput {
        customer_id: auth.user_id(),
        milkman_id,
        litres: payload.litres,
        entry_date: payload.date,
        billing_cycle_days: payload.billing_cycle_days,
    };

    let priced =
        match PurchaseService::price(&input, Utc::now().date_naive(), |_| Ok(price)) {
            Ok(priced) => priced,
            Err(e) => return purchase_error(&e),
        };

    let purchase_repo = PurchaseRepository::new((*state.db).clone());
    match purchase_repo.upsert_daily(&priced).await {
        Ok(purchase) => {
            info!(
                customer_id = %priced.customer_id,
                milkman_id = %priced.milkman_id,
                entry_date = %priced.entry_date,
                amount = %priced.total_amount,
                "Purchase recorded"
            );
            (
                StatusCode::CREATED,
                Json(json!({
                    "message": "Purchase recorded successfully",
                    "purchase": to_ledger_entry(&purchase)
                })),
            )
                .into_response()
        }
        Err(e) => purchase_error(&e),
    }
}

/// GET /purchases/mine - The customer's ledger with the unpaid total.
async fn customer_ledger(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    if auth.role() != Role::Customer {
        return forbidden("Only customers have a purchase ledger");
    }

    let purchase_repo = PurchaseRepository::new((*state.db).clone());
    match purchase_repo.list_for_customer(auth.user_id()).await {
        Ok(models) => {
            let statement =
                balance::customer_statement(models.iter().map(to_ledger_entry).collect());
            (
                StatusCode::OK,
                Json(json!({
                    "purchases": statement.entries,
                    "total_unpaid": statement.total_unpaid
                })),
            )
                .into_response()
        }
        Err(e) => purchase_error(&e),
    }
}

/// GET /purchases/customers - The milkman's ledger grouped by customer.
async fn milkman_ledger_by_customer(
    State(state): State<AppState>,
    auth: AuthUser,
) -> impl IntoResponse {
    if auth.role() != Role::Milkman {
        return forbidden("Only milkmen can view the customer roll-up");
    }

    let purchase_repo = PurchaseRepository::new((*state.db).clone());
    match purchase_repo.list_for_milkman(auth.user_id()).await {
        Ok(models) => {
            let ledger = balance::milkman_ledger(models.iter().map(to_ledger_entry).collect());
            (
                StatusCode::OK,
                Json(json!({ "customers": ledger.customers })),
            )
                .into_response()
        }
        Err(e) => purchase_error(&e),
    }
}

/// POST /purchases/{purchase_id}/mark-paid - Milkman's manual settle.
///
/// Bypasses the gateway but keeps the one-directional paid transition.
async fn mark_paid(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(purchase_id): Path<Uuid>,
) -> impl IntoResponse {
    if auth.role() != Role::Milkman {
        return forbidden("Only milkmen can mark purchases paid");
    }

    let purchase_repo = PurchaseRepository::new((*state.db).clone());
    match purchase_repo
        .mark_paid_direct(auth.user_id(), purchase_id)
        .await
    {
        Ok(purchase) => {
            info!(purchase_id = %purchase.id, "Purchase marked paid manually");
            (
                StatusCode::OK,
                Json(json!({
                    "message": "Purchase marked as paid",
                    "purchase": to_ledger_entry(&purchase)
                })),
            )
                .into_response()
        }
        Err(e) => purchase_error(&e),
    }
}
