//! Offer handlers
//!
//! Buyers make offers on listings; each side then moves the offer through
//! its lifecycle with one POST per action.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::{OfferInput, OfferSide};
use crate::domain::entities::{Offer, OfferAction, OfferId, OfferStatus, ProductId, User};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListOffersQuery {
    pub side: Option<OfferSide>,
    pub status: Option<OfferStatus>,
    #[serde(default = "super::default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

#[derive(Debug, Deserialize)]
pub struct CounterRequest {
    pub price_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct OfferResponse {
    pub id: String,
    pub product_id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub quantity: f64,
    pub price_cents: i64,
    pub counter_price_cents: Option<i64>,
    /// Price per unit the parties have settled on so far
    pub agreed_price_cents: i64,
    pub total_cents: i64,
    pub message: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Offer> for OfferResponse {
    fn from(o: Offer) -> Self {
        Self {
            agreed_price_cents: o.agreed_price_cents(),
            total_cents: o.total_cents(),
            id: o.id.to_string(),
            product_id: o.product_id.to_string(),
            buyer_id: o.buyer_id.to_string(),
            seller_id: o.seller_id.to_string(),
            quantity: o.quantity,
            price_cents: o.price_cents,
            counter_price_cents: o.counter_price_cents,
            message: o.message,
            status: o.status.to_string(),
            created_at: o.created_at.to_rfc3339(),
            updated_at: o.updated_at.to_rfc3339(),
        }
    }
}

/// POST /products/:id/offers
pub async fn create_offer(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(product_id): Path<Uuid>,
    Json(input): Json<OfferInput>,
) -> Result<(StatusCode, Json<OfferResponse>), AppError> {
    let offer = state
        .offer_service
        .create(&user, &ProductId(product_id), input)
        .await?;
    Ok((StatusCode::CREATED, Json(offer.into())))
}

/// GET /offers
pub async fn list_offers(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ListOffersQuery>,
) -> Result<Json<Vec<OfferResponse>>, AppError> {
    let offers = state
        .offer_service
        .list(&user, query.side, query.status, query.limit, query.offset)
        .await?;
    Ok(Json(offers.into_iter().map(Into::into).collect()))
}

/// GET /offers/:id
pub async fn get_offer(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<OfferResponse>, AppError> {
    let offer = state.offer_service.get(&user, &OfferId(id)).await?;
    Ok(Json(offer.into()))
}

async fn act(
    state: &AppState,
    user: &User,
    id: Uuid,
    action: OfferAction,
) -> Result<Json<OfferResponse>, AppError> {
    let offer = state.offer_service.act(user, &OfferId(id), action).await?;
    Ok(Json(offer.into()))
}

/// POST /offers/:id/accept
pub async fn accept_offer(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<OfferResponse>, AppError> {
    act(&state, &user, id, OfferAction::Accept).await
}

/// POST /offers/:id/reject
pub async fn reject_offer(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<OfferResponse>, AppError> {
    act(&state, &user, id, OfferAction::Reject).await
}

/// POST /offers/:id/counter
pub async fn counter_offer(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<CounterRequest>,
) -> Result<Json<OfferResponse>, AppError> {
    act(
        &state,
        &user,
        id,
        OfferAction::Counter {
            price_cents: request.price_cents,
        },
    )
    .await
}

/// POST /offers/:id/cancel
pub async fn cancel_offer(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<OfferResponse>, AppError> {
    act(&state, &user, id, OfferAction::Cancel).await
}

/// POST /offers/:id/ship
pub async fn ship_offer(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<OfferResponse>, AppError> {
    act(&state, &user, id, OfferAction::Ship).await
}

/// POST /offers/:id/complete
pub async fn complete_offer(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<OfferResponse>, AppError> {
    act(&state, &user, id, OfferAction::Complete).await
}
