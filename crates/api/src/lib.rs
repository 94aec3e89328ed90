//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Authentication middleware
//! - The payment-gateway HTTP client

pub mod gateway;
pub mod middleware;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use milkbook_core::payment::PaymentGateway;
use milkbook_shared::JwtService;
use milkbook_shared::config::GatewayConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Payment gateway client.
    pub gateway: Arc<dyn PaymentGateway>,
    /// Process-wide gateway configuration (default key pair).
    pub gateway_config: Arc<GatewayConfig>,
}

impl AppState {
    /// The process-wide default gateway key pair, if configured.
    #[must_use]
    pub fn default_gateway_keys(&self) -> Option<(String, String)> {
        self.gateway_config
            .key_id
            .clone()
            .zip(self.gateway_config.key_secret.clone())
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
