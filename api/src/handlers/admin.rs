//! Admin account handlers and dashboard

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::DashboardStats;
use crate::domain::entities::{Role, User, UserFilter, UserId};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<Role>,
    pub banned: Option<bool>,
    /// Matches name or email
    pub q: Option<String>,
    #[serde(default = "super::default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

impl From<ListUsersQuery> for UserFilter {
    fn from(q: ListUsersQuery) -> Self {
        UserFilter {
            role: q.role,
            banned: q.banned,
            search: q.q,
            limit: q.limit,
            offset: q.offset,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}

/// Full account view for moderators
#[derive(Debug, Serialize)]
pub struct AdminUserResponse {
    pub id: String,
    pub email: String,
    pub phone: Option<String>,
    pub full_name: String,
    pub role: String,
    pub is_verified: bool,
    pub is_banned: bool,
    pub created_at: String,
    pub last_login_at: Option<String>,
}

impl From<User> for AdminUserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id.to_string(),
            email: u.email,
            phone: u.phone,
            full_name: u.full_name,
            role: u.role.to_string(),
            is_verified: u.is_verified,
            is_banned: u.is_banned,
            created_at: u.created_at.to_rfc3339(),
            last_login_at: u.last_login_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// GET /admin/users
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<AdminUserResponse>>, AppError> {
    let users = state.admin_service.list_users(query.into()).await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// POST /admin/users/:id/ban
pub async fn ban_user(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<AdminUserResponse>, AppError> {
    let user = state
        .admin_service
        .set_banned(&admin, &UserId(id), true)
        .await?;
    Ok(Json(user.into()))
}

/// POST /admin/users/:id/unban
pub async fn unban_user(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<AdminUserResponse>, AppError> {
    let user = state
        .admin_service
        .set_banned(&admin, &UserId(id), false)
        .await?;
    Ok(Json(user.into()))
}

/// PUT /admin/users/:id/role
pub async fn set_role(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetRoleRequest>,
) -> Result<Json<AdminUserResponse>, AppError> {
    let user = state
        .admin_service
        .set_role(&admin, &UserId(id), request.role)
        .await?;
    Ok(Json(user.into()))
}

/// GET /admin/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(state.admin_service.stats().await?))
}
