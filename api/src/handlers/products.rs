//! Product handlers
//!
//! Marketplace search, seller listing management, and the admin
//! moderation queue.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::{CdnUrls, ProductInput, Removal};
use crate::auth::bearer_token;
use crate::domain::entities::{
    Product, ProductId, ProductQuery, ProductSort, ProductStatus, ProductUpdate, Unit, User, UserId,
};
use crate::error::AppError;
use crate::AppState;

/// Marketplace search parameters. Prices are in paise.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub organic: Option<bool>,
    pub seller_id: Option<Uuid>,
    pub location: Option<String>,
    #[serde(default)]
    pub sort: ProductSort,
    #[serde(default = "super::default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

impl From<SearchQuery> for ProductQuery {
    fn from(q: SearchQuery) -> Self {
        ProductQuery {
            text: q.q.filter(|s| !s.trim().is_empty()),
            category: q.category.map(|c| c.trim().to_lowercase()),
            min_price_cents: q.min_price,
            max_price_cents: q.max_price,
            organic: q.organic,
            seller_id: q.seller_id.map(UserId),
            location: q.location.filter(|s| !s.trim().is_empty()),
            status: Some(ProductStatus::Active),
            sort: q.sort,
            limit: q.limit,
            offset: q.offset,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<ProductStatus>,
    #[serde(default = "super::default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// Partial listing edit
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit: Option<Unit>,
    pub price_cents: Option<i64>,
    pub quantity_available: Option<f64>,
    pub location: Option<String>,
    pub organic: Option<bool>,
    pub harvest_date: Option<NaiveDate>,
    pub image_keys: Option<Vec<String>>,
}

impl From<UpdateProductRequest> for ProductUpdate {
    fn from(r: UpdateProductRequest) -> Self {
        ProductUpdate {
            title: r.title,
            description: r.description,
            category: r.category,
            unit: r.unit,
            price_cents: r.price_cents,
            quantity_available: r.quantity_available,
            location: r.location,
            organic: r.organic,
            harvest_date: r.harvest_date,
            image_keys: r.image_keys,
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub seller_id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub unit: String,
    pub price_cents: i64,
    pub quantity_available: f64,
    pub location: Option<String>,
    pub organic: bool,
    pub harvest_date: Option<NaiveDate>,
    pub image_keys: Vec<String>,
    pub image_urls: Vec<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ProductResponse {
    pub fn new(p: Product, urls: &CdnUrls) -> Self {
        Self {
            id: p.id.to_string(),
            seller_id: p.seller_id.to_string(),
            title: p.title,
            description: p.description,
            category: p.category,
            unit: p.unit.to_string(),
            price_cents: p.price_cents,
            quantity_available: p.quantity_available,
            location: p.location,
            organic: p.organic,
            harvest_date: p.harvest_date,
            image_urls: urls.urls(&p.image_keys),
            image_keys: p.image_keys,
            status: p.status.to_string(),
            rejection_reason: p.rejection_reason,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RemovalResponse {
    pub id: String,
    pub outcome: &'static str,
}

fn respond(products: Vec<Product>, urls: &CdnUrls) -> Json<Vec<ProductResponse>> {
    Json(
        products
            .into_iter()
            .map(|p| ProductResponse::new(p, urls))
            .collect(),
    )
}

/// GET /products
pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let products = state.product_service.search(query.into()).await?;
    Ok(respond(products, state.asset_service.urls()))
}

/// GET /products/:id
///
/// Public route. A valid bearer token lets sellers and admins see listings
/// that are not live yet.
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<ProductResponse>, AppError> {
    let viewer = match bearer_token(&headers) {
        Some(token) => state.auth_service.authenticate(token).await.ok(),
        None => None,
    };

    let product = state
        .product_service
        .get(&ProductId(id), viewer.as_ref())
        .await?;
    Ok(Json(ProductResponse::new(product, state.asset_service.urls())))
}

/// POST /products
pub async fn create_product(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    let product = state.product_service.create(&user, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductResponse::new(product, state.asset_service.urls())),
    ))
}

/// GET /products/mine
pub async fn list_my_products(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let products = state
        .product_service
        .list_mine(&user, query.status, query.limit, query.offset)
        .await?;
    Ok(respond(products, state.asset_service.urls()))
}

/// PATCH /products/:id
pub async fn update_product(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = state
        .product_service
        .update(&user, &ProductId(id), request.into())
        .await?;
    Ok(Json(ProductResponse::new(product, state.asset_service.urls())))
}

/// DELETE /products/:id
///
/// Listings that offers still point at are archived rather than removed.
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<RemovalResponse>, AppError> {
    let removal = state.product_service.delete(&user, &ProductId(id)).await?;
    Ok(Json(RemovalResponse {
        id: id.to_string(),
        outcome: match removal {
            Removal::Deleted => "deleted",
            Removal::Archived => "archived",
        },
    }))
}

/// GET /admin/products
pub async fn list_for_moderation(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let products = state
        .product_service
        .list_for_moderation(query.status, query.limit, query.offset)
        .await?;
    Ok(respond(products, state.asset_service.urls()))
}

/// POST /admin/products/:id/approve
pub async fn approve_product(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = state.product_service.approve(&admin, &ProductId(id)).await?;
    Ok(Json(ProductResponse::new(product, state.asset_service.urls())))
}

/// POST /admin/products/:id/reject
pub async fn reject_product(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = state
        .product_service
        .reject(&admin, &ProductId(id), &request.reason)
        .await?;
    Ok(Json(ProductResponse::new(product, state.asset_service.urls())))
}
