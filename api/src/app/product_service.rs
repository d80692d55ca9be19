//! Product service
//!
//! Listing creation and edits, marketplace search, and admin moderation.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::app::AssetService;
use crate::domain::entities::{
    validate_owned_keys, AssetPurpose, NewProduct, NotificationKind, OutgoingNotification, Product,
    ProductId, ProductQuery, ProductStatus, ProductUpdate, Unit, User, UserId,
    MAX_PRODUCT_IMAGES,
};
use crate::domain::ports::{Notify, ObjectStore, OfferRepository, ProductRepository};
use crate::error::{AppError, DomainError};

/// Largest page a search may request
pub const MAX_SEARCH_LIMIT: u64 = 100;

/// Fields a seller supplies for a new listing
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub unit: Unit,
    pub price_cents: i64,
    pub quantity_available: f64,
    pub location: Option<String>,
    #[serde(default)]
    pub organic: bool,
    pub harvest_date: Option<NaiveDate>,
    #[serde(default)]
    pub image_keys: Vec<String>,
}

/// Outcome of deleting a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Deleted,
    /// Offers still reference the listing, so it was archived instead
    Archived,
}

fn validate_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    let len = title.chars().count();
    if !(3..=120).contains(&len) {
        return Err(AppError::BadRequest(
            "Title must be between 3 and 120 characters".to_string(),
        ));
    }
    Ok(title.to_string())
}

fn validate_category(category: &str) -> Result<String, AppError> {
    let category = category.trim().to_lowercase();
    if category.is_empty() || category.len() > 50 {
        return Err(AppError::BadRequest(
            "Category must be between 1 and 50 characters".to_string(),
        ));
    }
    Ok(category)
}

fn validate_price(price_cents: i64) -> Result<(), AppError> {
    if price_cents <= 0 {
        return Err(AppError::BadRequest("Price must be positive".to_string()));
    }
    Ok(())
}

fn validate_quantity(quantity: f64) -> Result<(), AppError> {
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(AppError::BadRequest(
            "Quantity cannot be negative".to_string(),
        ));
    }
    Ok(())
}

fn validate_images(seller_id: &UserId, keys: &[String]) -> Result<(), AppError> {
    if keys.len() > MAX_PRODUCT_IMAGES {
        return Err(AppError::BadRequest(format!(
            "A listing can have at most {} images",
            MAX_PRODUCT_IMAGES
        )));
    }
    validate_owned_keys(AssetPurpose::Product, seller_id, keys).map_err(AppError::BadRequest)
}

/// Status a listing moves to after its stock changes
fn status_for_stock(current: ProductStatus, quantity: f64) -> ProductStatus {
    match current {
        ProductStatus::Active if quantity <= 0.0 => ProductStatus::SoldOut,
        ProductStatus::SoldOut if quantity > 0.0 => ProductStatus::Active,
        status => status,
    }
}

pub struct ProductService<PR, OR, N, OS>
where
    PR: ProductRepository,
    OR: OfferRepository,
    N: Notify,
    OS: ObjectStore,
{
    products: Arc<PR>,
    offers: Arc<OR>,
    notifier: Arc<N>,
    assets: Arc<AssetService<OS>>,
}

impl<PR, OR, N, OS> ProductService<PR, OR, N, OS>
where
    PR: ProductRepository,
    OR: OfferRepository,
    N: Notify,
    OS: ObjectStore,
{
    pub fn new(
        products: Arc<PR>,
        offers: Arc<OR>,
        notifier: Arc<N>,
        assets: Arc<AssetService<OS>>,
    ) -> Self {
        Self {
            products,
            offers,
            notifier,
            assets,
        }
    }

    async fn find(&self, id: &ProductId) -> Result<Product, AppError> {
        self.products
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))
    }

    /// Listing the caller owns, or any listing for an admin
    async fn find_managed(&self, user: &User, id: &ProductId) -> Result<Product, AppError> {
        let product = self.find(id).await?;
        if product.seller_id != user.id && !user.is_admin() {
            return Err(AppError::Forbidden(
                "You can only manage your own listings".to_string(),
            ));
        }
        Ok(product)
    }

    /// New listings wait for moderation unless the seller is verified
    pub async fn create(&self, seller: &User, input: ProductInput) -> Result<Product, AppError> {
        if !seller.can_sell() {
            return Err(AppError::Forbidden(
                "Only farmers can create listings".to_string(),
            ));
        }

        let title = validate_title(&input.title)?;
        let category = validate_category(&input.category)?;
        validate_price(input.price_cents)?;
        validate_quantity(input.quantity_available)?;
        validate_images(&seller.id, &input.image_keys)?;

        let status = if !seller.is_verified {
            ProductStatus::PendingReview
        } else if input.quantity_available > 0.0 {
            ProductStatus::Active
        } else {
            ProductStatus::SoldOut
        };

        let product = self
            .products
            .create(&NewProduct {
                seller_id: seller.id,
                title,
                description: input.description.filter(|d| !d.trim().is_empty()),
                category,
                unit: input.unit,
                price_cents: input.price_cents,
                quantity_available: input.quantity_available,
                location: input.location,
                organic: input.organic,
                harvest_date: input.harvest_date,
                image_keys: input.image_keys,
                status,
            })
            .await?;

        tracing::info!(
            product_id = %product.id,
            seller_id = %seller.id,
            status = %product.status,
            "Listing created"
        );
        Ok(product)
    }

    /// Edit a listing. A rejected listing goes back into the moderation queue.
    pub async fn update(
        &self,
        user: &User,
        id: &ProductId,
        mut update: ProductUpdate,
    ) -> Result<Product, AppError> {
        let product = self.find_managed(user, id).await?;
        if product.status == ProductStatus::Archived {
            return Err(AppError::Domain(DomainError::Conflict(
                "Archived listings cannot be edited".to_string(),
            )));
        }

        if let Some(title) = &update.title {
            update.title = Some(validate_title(title)?);
        }
        if let Some(category) = &update.category {
            update.category = Some(validate_category(category)?);
        }
        if let Some(price) = update.price_cents {
            validate_price(price)?;
        }
        if let Some(quantity) = update.quantity_available {
            validate_quantity(quantity)?;
        }
        if let Some(keys) = &update.image_keys {
            validate_images(&product.seller_id, keys)?;
        }

        // Status and moderation notes are not caller-editable
        update.status = None;
        update.rejection_reason = None;

        if product.status == ProductStatus::Rejected {
            update.status = Some(ProductStatus::PendingReview);
            update.rejection_reason = Some(None);
        } else if let Some(quantity) = update.quantity_available {
            let next = status_for_stock(product.status, quantity);
            if next != product.status {
                update.status = Some(next);
            }
        }

        let removed: Vec<String> = match &update.image_keys {
            Some(keys) => product
                .image_keys
                .iter()
                .filter(|k| !keys.contains(k))
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        let updated = self.products.update(id, &update).await?;
        self.assets.delete_best_effort(&removed).await;
        Ok(updated)
    }

    /// Hard-delete a listing nobody has made offers on; archive it otherwise
    pub async fn delete(&self, user: &User, id: &ProductId) -> Result<Removal, AppError> {
        let product = self.find_managed(user, id).await?;

        if self.offers.count_for_product(id).await? > 0 {
            self.products
                .update(
                    id,
                    &ProductUpdate {
                        status: Some(ProductStatus::Archived),
                        ..Default::default()
                    },
                )
                .await?;
            return Ok(Removal::Archived);
        }

        self.products.delete(id).await?;
        self.assets.delete_best_effort(&product.image_keys).await;
        Ok(Removal::Deleted)
    }

    /// Public view. Unlisted states are visible only to the owner and admins.
    pub async fn get(&self, id: &ProductId, viewer: Option<&User>) -> Result<Product, AppError> {
        let product = self.find(id).await?;
        let public = matches!(
            product.status,
            ProductStatus::Active | ProductStatus::SoldOut
        );
        let privileged = viewer.is_some_and(|u| u.id == product.seller_id || u.is_admin());
        if !public && !privileged {
            return Err(AppError::NotFound(format!("Product {} not found", id)));
        }
        Ok(product)
    }

    /// Marketplace search: active listings only
    pub async fn search(&self, mut query: ProductQuery) -> Result<Vec<Product>, AppError> {
        query.status = Some(ProductStatus::Active);
        query.limit = query.limit.clamp(1, MAX_SEARCH_LIMIT);
        if let (Some(min), Some(max)) = (query.min_price_cents, query.max_price_cents) {
            if min > max {
                return Err(AppError::BadRequest(
                    "min_price cannot exceed max_price".to_string(),
                ));
            }
        }
        Ok(self.products.search(&query).await?)
    }

    /// A seller's own listings in any state
    pub async fn list_mine(
        &self,
        seller: &User,
        status: Option<ProductStatus>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Product>, AppError> {
        let query = ProductQuery {
            seller_id: Some(seller.id),
            status,
            limit: limit.clamp(1, MAX_SEARCH_LIMIT),
            offset,
            ..Default::default()
        };
        Ok(self.products.search(&query).await?)
    }

    /// Admin listing, defaulting to the moderation queue
    pub async fn list_for_moderation(
        &self,
        status: Option<ProductStatus>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Product>, AppError> {
        let query = ProductQuery {
            status: Some(status.unwrap_or(ProductStatus::PendingReview)),
            limit: limit.clamp(1, MAX_SEARCH_LIMIT),
            offset,
            ..Default::default()
        };
        Ok(self.products.search(&query).await?)
    }

    pub async fn approve(&self, admin: &User, id: &ProductId) -> Result<Product, AppError> {
        let product = self.find(id).await?;
        if !matches!(
            product.status,
            ProductStatus::PendingReview | ProductStatus::Rejected
        ) {
            return Err(AppError::Domain(DomainError::Conflict(
                format!("Listing is {}, not awaiting review", product.status),
            )));
        }

        let status = if product.quantity_available > 0.0 {
            ProductStatus::Active
        } else {
            ProductStatus::SoldOut
        };
        let updated = self
            .products
            .update(
                id,
                &ProductUpdate {
                    status: Some(status),
                    rejection_reason: Some(None),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(product_id = %id, admin_id = %admin.id, "Listing approved");
        self.notifier
            .notify_best_effort(
                &updated.seller_id,
                OutgoingNotification::new(
                    NotificationKind::ProductModerated,
                    "Listing approved",
                    format!("\"{}\" is now live on AgriLink.", updated.title),
                )
                .with_data(serde_json::json!({ "product_id": updated.id })),
            )
            .await;
        Ok(updated)
    }

    pub async fn reject(
        &self,
        admin: &User,
        id: &ProductId,
        reason: &str,
    ) -> Result<Product, AppError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::BadRequest(
                "A rejection reason is required".to_string(),
            ));
        }
        let product = self.find(id).await?;
        if product.status == ProductStatus::Archived {
            return Err(AppError::Domain(DomainError::Conflict(
                "Archived listings cannot be moderated".to_string(),
            )));
        }

        let updated = self
            .products
            .update(
                id,
                &ProductUpdate {
                    status: Some(ProductStatus::Rejected),
                    rejection_reason: Some(Some(reason.to_string())),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(product_id = %id, admin_id = %admin.id, "Listing rejected");
        self.notifier
            .notify_best_effort(
                &updated.seller_id,
                OutgoingNotification::new(
                    NotificationKind::ProductModerated,
                    "Listing needs changes",
                    format!("\"{}\" was not approved: {}", updated.title, reason),
                )
                .with_data(serde_json::json!({ "product_id": updated.id })),
            )
            .await;
        Ok(updated)
    }
}
