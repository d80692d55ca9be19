//! Notification handlers
//!
//! The in-app inbox, channel preferences, and the admin cost report and
//! broadcast.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{
    ChannelCost, Notification, NotificationId, NotificationPreferences, Role, User,
};
use crate::error::AppError;
use crate::AppState;

use super::CountResponse;

#[derive(Debug, Deserialize)]
pub struct InboxQuery {
    #[serde(default)]
    pub unread_only: bool,
    #[serde(default = "super::default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

#[derive(Debug, Deserialize)]
pub struct CostQuery {
    #[serde(default = "default_hours")]
    pub hours: i64,
}

fn default_hours() -> i64 {
    24
}

#[derive(Debug, Deserialize)]
pub struct BroadcastRequest {
    /// Limit the announcement to one role
    pub role: Option<Role>,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct BroadcastResponse {
    pub recipients: u64,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: String,
    pub kind: String,
    pub urgency: String,
    pub channel: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    pub downgraded: bool,
    pub read_at: Option<String>,
    pub created_at: String,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id.to_string(),
            kind: n.kind.to_string(),
            urgency: n.urgency.to_string(),
            channel: n.channel.to_string(),
            title: n.title,
            body: n.body,
            data: n.data,
            downgraded: n.downgraded,
            read_at: n.read_at.map(|t| t.to_rfc3339()),
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CostReport {
    pub hours: i64,
    pub channels: Vec<ChannelCost>,
    pub total_cost: f64,
}

/// GET /notifications
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<InboxQuery>,
) -> Result<Json<Vec<NotificationResponse>>, AppError> {
    let notifications = state
        .notification_service
        .list(&user.id, query.unread_only, query.limit, query.offset)
        .await?;
    Ok(Json(notifications.into_iter().map(Into::into).collect()))
}

/// GET /notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<CountResponse>, AppError> {
    let count = state.notification_service.unread_count(&user.id).await?;
    Ok(Json(CountResponse { count }))
}

/// POST /notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .notification_service
        .mark_read(&NotificationId(id), &user.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<CountResponse>, AppError> {
    let count = state.notification_service.mark_all_read(&user.id).await?;
    Ok(Json(CountResponse { count }))
}

/// GET /me/notification-preferences
pub async fn get_preferences(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<NotificationPreferences>, AppError> {
    Ok(Json(
        state.notification_service.get_preferences(&user.id).await?,
    ))
}

/// PUT /me/notification-preferences
pub async fn set_preferences(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(preferences): Json<NotificationPreferences>,
) -> Result<Json<NotificationPreferences>, AppError> {
    Ok(Json(
        state
            .notification_service
            .set_preferences(&user.id, preferences)
            .await?,
    ))
}

/// GET /admin/notifications/costs
pub async fn cost_report(
    State(state): State<AppState>,
    Query(query): Query<CostQuery>,
) -> Result<Json<CostReport>, AppError> {
    let channels = state
        .notification_service
        .cost_summary(query.hours)
        .await?;
    let total_cost = channels.iter().map(|c| c.total_cost).sum();
    Ok(Json(CostReport {
        hours: query.hours,
        channels,
        total_cost,
    }))
}

/// POST /admin/broadcast
pub async fn broadcast(
    State(state): State<AppState>,
    Json(request): Json<BroadcastRequest>,
) -> Result<Json<BroadcastResponse>, AppError> {
    let recipients = state
        .notification_service
        .broadcast(request.role, &request.title, &request.body)
        .await?;
    Ok(Json(BroadcastResponse { recipients }))
}
