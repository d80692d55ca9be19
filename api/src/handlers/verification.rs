//! Verification handlers
//!
//! Users submit identity or business documents; admins review them.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::CdnUrls;
use crate::domain::entities::{
    DocumentType, User, VerificationId, VerificationRequest, VerificationStatus,
};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitVerificationRequest {
    pub document_type: DocumentType,
    pub document_keys: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerificationQueueQuery {
    pub status: Option<VerificationStatus>,
    #[serde(default = "super::default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerificationResponse {
    pub id: String,
    pub user_id: String,
    pub document_type: String,
    pub document_urls: Vec<String>,
    pub notes: Option<String>,
    pub status: String,
    pub reviewer_id: Option<String>,
    pub review_notes: Option<String>,
    pub submitted_at: String,
    pub reviewed_at: Option<String>,
}

impl VerificationResponse {
    pub fn new(r: VerificationRequest, urls: &CdnUrls) -> Self {
        Self {
            id: r.id.to_string(),
            user_id: r.user_id.to_string(),
            document_type: r.document_type.to_string(),
            document_urls: urls.urls(&r.document_keys),
            notes: r.notes,
            status: r.status.to_string(),
            reviewer_id: r.reviewer_id.map(|id| id.to_string()),
            review_notes: r.review_notes,
            submitted_at: r.submitted_at.to_rfc3339(),
            reviewed_at: r.reviewed_at.map(|t| t.to_rfc3339()),
        }
    }
}

fn respond(
    requests: Vec<VerificationRequest>,
    urls: &CdnUrls,
) -> Json<Vec<VerificationResponse>> {
    Json(
        requests
            .into_iter()
            .map(|r| VerificationResponse::new(r, urls))
            .collect(),
    )
}

/// POST /verification
pub async fn submit(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<SubmitVerificationRequest>,
) -> Result<(StatusCode, Json<VerificationResponse>), AppError> {
    let submitted = state
        .verification_service
        .submit(
            &user,
            request.document_type,
            request.document_keys,
            request.notes,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(VerificationResponse::new(
            submitted,
            state.asset_service.urls(),
        )),
    ))
}

/// GET /verification/mine
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<VerificationResponse>>, AppError> {
    let requests = state.verification_service.list_mine(&user).await?;
    Ok(respond(requests, state.asset_service.urls()))
}

/// GET /admin/verifications
pub async fn list_queue(
    State(state): State<AppState>,
    Query(query): Query<VerificationQueueQuery>,
) -> Result<Json<Vec<VerificationResponse>>, AppError> {
    let requests = state
        .verification_service
        .list(query.status, query.limit, query.offset)
        .await?;
    Ok(respond(requests, state.asset_service.urls()))
}

/// POST /admin/verifications/:id/approve
pub async fn approve(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(id): Path<Uuid>,
    body: Option<Json<DecisionRequest>>,
) -> Result<Json<VerificationResponse>, AppError> {
    let notes = body.and_then(|Json(b)| b.notes);
    let decided = state
        .verification_service
        .approve(&admin, &VerificationId(id), notes)
        .await?;
    Ok(Json(VerificationResponse::new(
        decided,
        state.asset_service.urls(),
    )))
}

/// POST /admin/verifications/:id/reject
pub async fn reject(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<VerificationResponse>, AppError> {
    let decided = state
        .verification_service
        .reject(
            &admin,
            &VerificationId(id),
            request.notes.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(Json(VerificationResponse::new(
        decided,
        state.asset_service.urls(),
    )))
}
