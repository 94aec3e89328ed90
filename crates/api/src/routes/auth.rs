//! Authentication routes: two-step signup, login, and profile.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use milkbook_core::auth::{generate_referral_code, hash_password, verify_password};
use milkbook_db::repositories::user::{CreateUserInput, UserError, UserRepository};
use milkbook_db::repositories::verification::{VerificationError, VerificationRepository};
use milkbook_shared::auth::Role;

/// Creates the public auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/verify", post(verify))
        .route("/auth/login", post(login))
}

/// Creates the authenticated auth router.
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/auth/profile", get(profile))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for signup step 1 (code issuance).
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    /// Email address.
    pub email: String,
    /// Password (checked again at verification).
    pub password: String,
    /// Requested role.
    pub role: Role,
    /// Milkman referral code (customers only).
    pub referral_code: Option<String>,
}

/// Request body for signup step 2 (code verification + account creation).
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    /// Email address.
    pub email: String,
    /// The 6-digit verification code.
    pub code: String,
    /// Password.
    pub password: String,
    /// Requested role.
    pub role: Role,
    /// Milkman referral code (customers only).
    pub referral_code: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
}

/// A sanitized account view. Never carries the password hash or the gateway
/// secret.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// Account ID.
    pub id: Uuid,
    /// Email address.
    pub email: String,
    /// Role.
    pub role: Role,
    /// Linked milkman (customers only).
    pub milkman_id: Option<Uuid>,
    /// Referral code (milkmen only).
    pub referral_code: Option<String>,
    /// Price per litre (milkmen only).
    pub price_per_litre: Option<rust_decimal::Decimal>,
    /// Gateway key id (milkmen only; the secret is never exposed).
    pub gateway_key_id: Option<String>,
}

impl From<milkbook_db::entities::users::Model> for UserResponse {
    fn from(user: milkbook_db::entities::users::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role.into(),
            milkman_id: user.milkman_id,
            referral_code: user.referral_code,
            price_per_litre: user.price_per_litre,
            gateway_key_id: user.gateway_key_id,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Generates a 6-digit verification code.
fn generate_code() -> String {
    let bytes = Uuid::new_v4().into_bytes();
    let entropy = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    format!("{:06}", 100_000 + entropy % 900_000)
}

/// Validates the role/referral combination and resolves the milkman binding
/// for customers.
async fn resolve_referral(
    user_repo: &UserRepository,
    role: Role,
    referral_code: Option<&str>,
) -> Result<Option<Uuid>, axum::response::Response> {
    match role {
        Role::Customer => {
            let Some(code) = referral_code else {
                return Err(bad_request(
                    "referral_required",
                    "Customers must sign up with a milkman's referral code",
                ));
            };
            match user_repo.find_milkman_by_referral(code).await {
                Ok(Some(milkman)) => Ok(Some(milkman.id)),
                Ok(None) => Err(bad_request("invalid_referral", "Invalid referral code")),
                Err(e) => {
                    error!(error = %e, "Failed to look up referral code");
                    Err(internal_error())
                }
            }
        }
        Role::Milkman => {
            if referral_code.is_some() {
                return Err(bad_request(
                    "referral_not_allowed",
                    "Milkmen cannot sign up with a referral code",
                ));
            }
            Ok(None)
        }
    }
}

fn bad_request(error: &str, message: &str) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": error, "message": message })),
    )
        .into_response()
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

/// POST /auth/signup - Validate the request and issue a verification code.
async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> impl IntoResponse {
    if payload.email.trim().is_empty() || !payload.email.contains('@') {
        return bad_request("invalid_email", "A valid email address is required");
    }
    if payload.password.len() < 8 {
        return bad_request(
            "weak_password",
            "Password must be at least 8 characters long",
        );
    }

    let user_repo = UserRepository::new((*state.db).clone());

    match user_repo.find_by_email(&payload.email).await {
        Ok(Some(_)) => {
            return bad_request("email_taken", "Email already registered");
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "Failed to check existing email");
            return internal_error();
        }
    }

    if let Err(response) =
        resolve_referral(&user_repo, payload.role, payload.referral_code.as_deref()).await
    {
        return response;
    }

    let code = generate_code();
    let verification_repo = VerificationRepository::new((*state.db).clone());
    if let Err(e) = verification_repo
        .issue(&payload.email, &code, chrono::Utc::now())
        .await
    {
        error!(error = %e, "Failed to issue verification code");
        return internal_error();
    }

    // Out-of-band delivery is not wired up; the code is surfaced through the
    // operational log.
    info!(
        email = %payload.email,
        verification_code = %code,
        "Verification code issued"
    );

    (
        StatusCode::OK,
        Json(json!({
            "message": "Verification code issued. Verify within 10 minutes.",
            "email": payload.email
        })),
    )
        .into_response()
}

/// POST /auth/verify - Consume the verification code and create the account.
async fn verify(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> impl IntoResponse {
    let verification_repo = VerificationRepository::new((*state.db).clone());
    match verification_repo
        .consume(&payload.email, &payload.code, chrono::Utc::now())
        .await
    {
        Ok(()) => {}
        Err(VerificationError::NotFound(_)) => {
            return bad_request("code_not_found", "No active verification code");
        }
        Err(VerificationError::Expired) => {
            return bad_request("code_expired", "Verification code expired. Request a new one.");
        }
        Err(VerificationError::Mismatch) => {
            return bad_request("invalid_code", "Invalid verification code");
        }
        Err(e) => {
            error!(error = %e, "Failed to consume verification code");
            return internal_error();
        }
    }

    let user_repo = UserRepository::new((*state.db).clone());
    let milkman_id =
        match resolve_referral(&user_repo, payload.role, payload.referral_code.as_deref()).await {
            Ok(id) => id,
            Err(response) => return response,
        };

    let password_hash = match hash_password(&payload.password) {
        Ok(hash) => hash,
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            return internal_error();
        }
    };

    // Referral codes are random; on the rare collision, regenerate.
    let mut attempts = 0;
    let user = loop {
        let referral_code = match payload.role {
            Role::Milkman => Some(generate_referral_code(&payload.email)),
            Role::Customer => None,
        };

        match user_repo
            .create(CreateUserInput {
                email: payload.email.clone(),
                password_hash: password_hash.clone(),
                role: payload.role,
                milkman_id,
                referral_code,
            })
            .await
        {
            Ok(user) => break user,
            Err(UserError::ReferralCodeTaken) if attempts < 3 => {
                attempts += 1;
            }
            Err(UserError::EmailTaken(_)) => {
                return bad_request("email_taken", "Email already registered");
            }
            Err(e) => {
                error!(error = %e, "Failed to create account");
                return internal_error();
            }
        }
    };

    let token = match state
        .jwt_service
        .generate_token(user.id, payload.role, user.milkman_id)
    {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "Failed to generate token");
            return internal_error();
        }
    };

    info!(user_id = %user.id, role = %payload.role, "Account registered and verified");

    (
        StatusCode::CREATED,
        Json(json!({
            "message": "Account registered and verified",
            "token": token,
            "expires_in": state.jwt_service.token_expires_in(),
            "user": UserResponse::from(user)
        })),
    )
        .into_response()
}

/// POST /auth/login - Authenticate and return a token.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    let user = match user_repo.find_by_email(&payload.email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            info!(email = %payload.email, "Login attempt for non-existent account");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_credentials",
                    "message": "Invalid email or password"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error during login");
            return internal_error();
        }
    };

    if !user.is_verified {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "not_verified",
                "message": "Email not verified"
            })),
        )
            .into_response();
    }

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            info!(user_id = %user.id, "Failed login attempt - invalid password");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_credentials",
                    "message": "Invalid email or password"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Password verification error");
            return internal_error();
        }
    }

    let role: Role = user.role.clone().into();
    let token = match state
        .jwt_service
        .generate_token(user.id, role, user.milkman_id)
    {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "Failed to generate token");
            return internal_error();
        }
    };

    (
        StatusCode::OK,
        Json(json!({
            "message": "Login successful",
            "token": token,
            "expires_in": state.jwt_service.token_expires_in(),
            "user": UserResponse::from(user)
        })),
    )
        .into_response()
}

/// GET /auth/profile - The authenticated account.
async fn profile(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    match user_repo.find_by_id(auth.user_id()).await {
        Ok(Some(user)) => {
            (StatusCode::OK, Json(json!({ "user": UserResponse::from(user) }))).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Account not found"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to load profile");
            internal_error()
        }
    }
}
