//! Profile handlers
//!
//! Own account, public profiles, device tokens, and saved addresses.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::CdnUrls;
use crate::domain::entities::{Address, AddressId, AddressInput, ProfileUpdate, User, UserId};
use crate::error::AppError;
use crate::AppState;

/// The signed-in user's own account
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub phone: Option<String>,
    pub full_name: String,
    pub role: String,
    pub is_verified: bool,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub created_at: String,
    pub last_login_at: Option<String>,
}

impl UserResponse {
    pub fn new(user: User, urls: &CdnUrls) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email,
            phone: user.phone,
            full_name: user.full_name,
            role: user.role.to_string(),
            is_verified: user.is_verified,
            avatar_url: user.avatar_key.as_deref().map(|k| urls.url(k)),
            bio: user.bio,
            location: user.location,
            created_at: user.created_at.to_rfc3339(),
            last_login_at: user.last_login_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// What other users see. No contact details.
#[derive(Debug, Serialize)]
pub struct PublicUserResponse {
    pub id: String,
    pub full_name: String,
    pub role: String,
    pub is_verified: bool,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub member_since: String,
}

impl PublicUserResponse {
    pub fn new(user: User, urls: &CdnUrls) -> Self {
        Self {
            id: user.id.to_string(),
            full_name: user.full_name,
            role: user.role.to_string(),
            is_verified: user.is_verified,
            avatar_url: user.avatar_key.as_deref().map(|k| urls.url(k)),
            bio: user.bio,
            location: user.location,
            member_since: user.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub avatar_key: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(r: UpdateProfileRequest) -> Self {
        ProfileUpdate {
            full_name: r.full_name,
            phone: r.phone,
            bio: r.bio,
            location: r.location,
            avatar_key: r.avatar_key,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PushTokenRequest {
    /// `null` or blank unregisters the device
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddressResponse {
    pub id: String,
    pub label: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
}

impl From<Address> for AddressResponse {
    fn from(a: Address) -> Self {
        Self {
            id: a.id.to_string(),
            label: a.label,
            line1: a.line1,
            line2: a.line2,
            city: a.city,
            region: a.region,
            postal_code: a.postal_code,
            country: a.country,
            is_default: a.is_default,
        }
    }
}

/// GET /me
pub async fn get_me(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Json<UserResponse> {
    Json(UserResponse::new(user, state.asset_service.urls()))
}

/// PATCH /me
pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let updated = state
        .profile_service
        .update_profile(&user, request.into())
        .await?;
    Ok(Json(UserResponse::new(updated, state.asset_service.urls())))
}

/// PUT /me/push-token
pub async fn set_push_token(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<PushTokenRequest>,
) -> Result<StatusCode, AppError> {
    state
        .profile_service
        .set_push_token(&user.id, request.token)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/:id
pub async fn get_public_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUserResponse>, AppError> {
    let user = state.profile_service.public_profile(&UserId(id)).await?;
    Ok(Json(PublicUserResponse::new(user, state.asset_service.urls())))
}

/// GET /me/addresses
pub async fn list_addresses(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<AddressResponse>>, AppError> {
    let addresses = state.profile_service.list_addresses(&user.id).await?;
    Ok(Json(addresses.into_iter().map(Into::into).collect()))
}

/// POST /me/addresses
pub async fn add_address(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(input): Json<AddressInput>,
) -> Result<(StatusCode, Json<AddressResponse>), AppError> {
    let address = state.profile_service.add_address(&user.id, input).await?;
    Ok((StatusCode::CREATED, Json(address.into())))
}

/// PATCH /me/addresses/:id
pub async fn update_address(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(input): Json<AddressInput>,
) -> Result<Json<AddressResponse>, AppError> {
    let address = state
        .profile_service
        .update_address(&user.id, &AddressId(id), input)
        .await?;
    Ok(Json(address.into()))
}

/// DELETE /me/addresses/:id
pub async fn delete_address(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .profile_service
        .delete_address(&user.id, &AddressId(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /me/addresses/:id/default
pub async fn set_default_address(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .profile_service
        .set_default_address(&user.id, &AddressId(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
