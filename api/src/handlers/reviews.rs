//! Review handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{OfferId, RatingSummary, Review, ReviewId, User, UserId};
use crate::error::AppError;
use crate::AppState;

use super::Pagination;

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: i16,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: String,
    pub offer_id: String,
    pub reviewer_id: String,
    pub reviewee_id: String,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: String,
}

impl From<Review> for ReviewResponse {
    fn from(r: Review) -> Self {
        Self {
            id: r.id.to_string(),
            offer_id: r.offer_id.to_string(),
            reviewer_id: r.reviewer_id.to_string(),
            reviewee_id: r.reviewee_id.to_string(),
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

/// POST /offers/:id/review
pub async fn create_review(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(offer_id): Path<Uuid>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), AppError> {
    let review = state
        .review_service
        .create(&user, &OfferId(offer_id), request.rating, request.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(review.into())))
}

/// GET /users/:id/reviews
pub async fn list_user_reviews(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<ReviewResponse>>, AppError> {
    let reviews = state
        .review_service
        .list_for_user(&UserId(user_id), page.limit, page.offset)
        .await?;
    Ok(Json(reviews.into_iter().map(Into::into).collect()))
}

/// GET /users/:id/rating
pub async fn get_user_rating(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<RatingSummary>, AppError> {
    Ok(Json(state.review_service.summary(&UserId(user_id)).await?))
}

/// DELETE /reviews/:id and DELETE /admin/reviews/:id
pub async fn delete_review(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.review_service.delete(&user, &ReviewId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
