//! Bearer token authentication middleware

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::domain::entities::User;
use crate::error::AppError;
use crate::AppState;

/// Extract the bearer token from the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Authentication middleware
///
/// Verifies the JWT, reloads the user, and injects the `User` into request
/// extensions. Unknown users get 401; banned users get 403.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or(AppError::Unauthorized)?;

    let user = state.auth_service.authenticate(token).await?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Admin gate
///
/// Must run after `auth_middleware`. Admin rights come from the user's role.
pub async fn admin_middleware(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<User>()
        .ok_or(AppError::Unauthorized)?;

    if !user.is_admin() {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    Ok(next.run(request).await)
}
