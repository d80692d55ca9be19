//! Upload handler
//!
//! The request body is the raw file; its `Content-Type` header decides the
//! extension and whether the purpose accepts it.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    Extension, Json,
};

use crate::app::StoredAsset;
use crate::domain::entities::{AssetPurpose, User};
use crate::error::AppError;
use crate::AppState;

/// POST /uploads/:purpose
pub async fn upload(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(purpose): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<StoredAsset>), AppError> {
    let purpose: AssetPurpose = purpose.parse().map_err(AppError::BadRequest)?;
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Content-Type header is required".to_string()))?;

    let asset = state
        .asset_service
        .upload(&user.id, purpose, content_type, body.to_vec())
        .await?;

    Ok((StatusCode::CREATED, Json(asset)))
}
