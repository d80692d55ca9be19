//! Authentication handlers
//!
//! Registration, login, token refresh and password management.

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::app::{IssuedToken, Registration};
use crate::domain::entities::User;
use crate::error::AppError;
use crate::handlers::profile::UserResponse;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

impl From<IssuedToken> for TokenResponse {
    fn from(t: IssuedToken) -> Self {
        Self {
            access_token: t.token,
            token_type: "Bearer",
            expires_in: t.expires_in,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub token: TokenResponse,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetConfirmRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(registration): Json<Registration>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let (user, token) = state.auth_service.register(registration).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token: token.into(),
            user: UserResponse::new(user, state.asset_service.urls()),
        }),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let (user, token) = state
        .auth_service
        .login(&request.email, &request.password)
        .await?;
    Ok(Json(AuthResponse {
        token: token.into(),
        user: UserResponse::new(user, state.asset_service.urls()),
    }))
}

/// POST /auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<TokenResponse>, AppError> {
    Ok(Json(state.auth_service.refresh(&user)?.into()))
}

/// POST /auth/password-reset/request
///
/// Always answers the same way so the endpoint cannot be used to probe
/// for registered emails.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(request): Json<ResetRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .auth_service
        .request_password_reset(&request.email)
        .await?;
    Ok(Json(MessageResponse {
        message: "If that account exists, a reset code has been sent",
    }))
}

/// POST /auth/password-reset/confirm
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(request): Json<ResetConfirmRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .auth_service
        .confirm_password_reset(&request.email, &request.code, &request.new_password)
        .await?;
    Ok(Json(MessageResponse {
        message: "Password updated",
    }))
}

/// PUT /me/password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    state
        .auth_service
        .change_password(&user, &request.current_password, &request.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
