//! Registration, login/logout, password reset and the current-user endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use fleet_core::access::Principal;
use fleet_core::user::{PasswordResetToken, Role, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{
        clear_session_cookie, generate_reset_token, hash_password, require_auth, session_cookie,
        validate_email, validate_password, verify_password,
    },
    error::ApiError,
    state::AppState,
};

const RESET_REQUESTED_MESSAGE: &str = "If an account exists, a reset link was sent to your email.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    email: String,
    password: String,
    confirm_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForgotPasswordRequest {
    email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordRequest {
    token: String,
    new_password: String,
    confirm_password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageResponse {
    ok: bool,
    message: String,
}

impl MessageResponse {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionUser {
    id: Uuid,
    email: String,
    role: Role,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    expires_at: String,
    user: SessionUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    id: Uuid,
    email: String,
    role: Role,
    assigned_vessel_ids: Vec<Uuid>,
}

fn format_expiry(exp: usize) -> String {
    chrono::DateTime::<Utc>::from_timestamp(exp as i64, 0)
        .map(|value| value.to_rfc3339())
        .unwrap_or_else(|| Utc::now().to_rfc3339())
}

/// Public sign-up; always creates a crew member with no vessels
async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let Json(req) = body?;
    let email = validate_email(&req.email)?;
    validate_password(&req.password)?;
    if req.password != req.confirm_password {
        return Err(ApiError::validation("Passwords do not match"));
    }

    if state.store().find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::validation(
            "An account with this email already exists",
        ));
    }
    let user = state
        .store()
        .create_user(User::new(&email, hash_password(&req.password), Role::CrewMember))
        .await?;
    tracing::info!(user_id = %user.id, "Registered crew member");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::ok(
            "Account created. Ask your admin to assign you to vessels before you can report issues.",
        )),
    ))
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    let user = state
        .store()
        .find_user_by_email(&req.email)
        .await?
        .filter(|user| verify_password(&user.password_hash, &req.password))
        .ok_or(ApiError::Unauthorized)?;

    let principal = Principal {
        id: user.id,
        email: user.email.clone(),
        role: user.role,
    };
    let (token, exp) = state.tokens().issue(&principal).map_err(|err| {
        tracing::error!("{}", err);
        ApiError::Internal
    })?;
    let cookie = session_cookie(state.config(), &token, state.tokens().ttl_seconds());

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            token,
            expires_at: format_expiry(exp),
            user: SessionUser {
                id: user.id,
                email: user.email,
                role: user.role,
            },
        }),
    ))
}

async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, clear_session_cookie(state.config()))],
        Json(MessageResponse::ok("Signed out.")),
    )
}

async fn forgot_password(
    State(state): State<AppState>,
    body: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = body?;
    let email = validate_email(&req.email)?;

    // Same answer whether or not the account exists
    let Some(user) = state.store().find_user_by_email(&email).await? else {
        return Ok(Json(MessageResponse::ok(RESET_REQUESTED_MESSAGE)));
    };

    let token = generate_reset_token();
    state
        .store()
        .replace_reset_token(PasswordResetToken::new(user.id, token.clone()))
        .await?;

    let reset_link = format!("{}/reset-password?token={}", state.config().app_url, token);
    if let Err(err) = state
        .mailer()
        .send_password_reset(&user.email, &reset_link)
        .await
    {
        tracing::error!(user_id = %user.id, "Failed to send password reset email: {}", err);
    }

    Ok(Json(MessageResponse::ok(RESET_REQUESTED_MESSAGE)))
}

async fn reset_password(
    State(state): State<AppState>,
    body: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = body?;
    if req.token.trim().is_empty() {
        return Err(ApiError::validation("Token required"));
    }
    validate_password(&req.new_password)?;
    if req.new_password != req.confirm_password {
        return Err(ApiError::validation("Passwords do not match"));
    }

    let record = state
        .store()
        .find_reset_token(req.token.trim())
        .await?
        .filter(|record| !record.is_expired_at(Utc::now()))
        .ok_or_else(|| ApiError::validation("Invalid or expired reset link. Request a new one."))?;

    let user = state
        .store()
        .consume_reset_token(record.id, hash_password(&req.new_password))
        .await?;
    tracing::info!(user_id = %user.id, "Password reset");

    Ok(Json(MessageResponse::ok(
        "Password updated. You can sign in now.",
    )))
}

async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, ApiError> {
    let principal = require_auth(&state, &headers)?;
    let user = state
        .store()
        .get_user(principal.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let assigned_vessel_ids = state
        .store()
        .list_assignments_for_user(user.id)
        .await?
        .into_iter()
        .map(|assignment| assignment.vessel_id)
        .collect();

    Ok(Json(MeResponse {
        id: user.id,
        email: user.email,
        role: user.role,
        assigned_vessel_ids,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
        .route("/api/me", get(me))
}
