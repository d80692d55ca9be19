//! PostgreSQL adapter for OfferRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::entities::{
    NewOffer, Offer, OfferFilter, OfferId, OfferStatus, ProductId, ProductStatus, UserId,
};
use crate::domain::ports::OfferRepository;
use crate::entity::{offers, products};
use crate::error::DomainError;

/// PostgreSQL implementation of OfferRepository
pub struct PostgresOfferRepository {
    db: DatabaseConnection,
}

impl PostgresOfferRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OfferRepository for PostgresOfferRepository {
    async fn find_by_id(&self, id: &OfferId) -> Result<Option<Offer>, DomainError> {
        let result = offers::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        result.map(Offer::try_from).transpose()
    }

    async fn list(&self, filter: &OfferFilter) -> Result<Vec<Offer>, DomainError> {
        // Buyer and seller filters are alternatives: "offers I'm part of"
        let mut parties = Condition::any();
        if let Some(buyer_id) = filter.buyer_id {
            parties = parties.add(offers::Column::BuyerId.eq(buyer_id.0));
        }
        if let Some(seller_id) = filter.seller_id {
            parties = parties.add(offers::Column::SellerId.eq(seller_id.0));
        }

        let mut cond = Condition::all();
        if !parties.is_empty() {
            cond = cond.add(parties);
        }
        if let Some(product_id) = filter.product_id {
            cond = cond.add(offers::Column::ProductId.eq(product_id.0));
        }
        if let Some(status) = filter.status {
            cond = cond.add(offers::Column::Status.eq(status.to_string()));
        }

        let results = offers::Entity::find()
            .filter(cond)
            .order_by_desc(offers::Column::UpdatedAt)
            .offset(filter.offset)
            .limit(filter.limit)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        results.into_iter().map(Offer::try_from).collect()
    }

    async fn create(&self, offer: &NewOffer) -> Result<Offer, DomainError> {
        let now = Utc::now().fixed_offset();

        let model = offers::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(offer.product_id.0),
            buyer_id: Set(offer.buyer_id.0),
            seller_id: Set(offer.seller_id.0),
            quantity: Set(offer.quantity),
            price_cents: Set(offer.price_cents),
            counter_price_cents: Set(None),
            message: Set(offer.message.clone()),
            status: Set(OfferStatus::Pending.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Offer::try_from(result)
    }

    async fn update_status(
        &self,
        id: &OfferId,
        from: OfferStatus,
        status: OfferStatus,
        counter_price_cents: Option<i64>,
    ) -> Result<Offer, DomainError> {
        // Compare-and-set on the status the caller validated against
        let mut update = offers::Entity::update_many()
            .col_expr(offers::Column::Status, Expr::value(status.to_string()))
            .col_expr(
                offers::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            );
        if let Some(price) = counter_price_cents {
            update = update.col_expr(offers::Column::CounterPriceCents, Expr::value(price));
        }

        let result = update
            .filter(offers::Column::Id.eq(id.0))
            .filter(offers::Column::Status.eq(from.to_string()))
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Offer {}", id)))?;
        if result.rows_affected == 0 {
            return Err(DomainError::Conflict(format!(
                "offer is already {}",
                current.status
            )));
        }

        Ok(current)
    }

    async fn accept(&self, id: &OfferId, from: OfferStatus) -> Result<Offer, DomainError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let offer = offers::Entity::find_by_id(id.0)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?
            .ok_or_else(|| DomainError::NotFound(format!("Offer {}", id)))?;

        let status: OfferStatus = offer.status.parse().map_err(DomainError::Internal)?;
        if status != from || !status.is_open() {
            return Err(DomainError::Conflict(format!("offer is already {}", status)));
        }

        let product = products::Entity::find_by_id(offer.product_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?
            .ok_or_else(|| DomainError::NotFound(format!("Product {}", offer.product_id)))?;

        if product.status != ProductStatus::Active.to_string() {
            return Err(DomainError::Conflict(
                "product is no longer available".to_string(),
            ));
        }
        if product.quantity_available < offer.quantity {
            return Err(DomainError::Conflict(format!(
                "only {} left in stock",
                product.quantity_available
            )));
        }

        let remaining = product.quantity_available - offer.quantity;
        let now = Utc::now().fixed_offset();
        let mut product_update = products::ActiveModel {
            id: Set(product.id),
            quantity_available: Set(remaining),
            updated_at: Set(now),
            ..Default::default()
        };
        if remaining <= 0.0 {
            product_update.quantity_available = Set(0.0);
            product_update.status = Set(ProductStatus::SoldOut.to_string());
        }
        product_update
            .update(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let accepted = offers::ActiveModel {
            id: Set(offer.id),
            status: Set(OfferStatus::Accepted.to_string()),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(&txn)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Offer::try_from(accepted)
    }

    async fn count_for_product(&self, product_id: &ProductId) -> Result<u64, DomainError> {
        offers::Entity::find()
            .filter(offers::Column::ProductId.eq(product_id.0))
            .count(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))
    }

    async fn count_by_status(&self) -> Result<Vec<(OfferStatus, u64)>, DomainError> {
        let rows: Vec<(String, i64)> = offers::Entity::find()
            .select_only()
            .column(offers::Column::Status)
            .column_as(Expr::col(offers::Column::Id).count(), "count")
            .group_by(offers::Column::Status)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|(status, count)| {
                let status: OfferStatus = status.parse().map_err(DomainError::Internal)?;
                Ok((status, count as u64))
            })
            .collect()
    }
}

/// Convert SeaORM model to domain entity
impl TryFrom<offers::Model> for Offer {
    type Error = DomainError;

    fn try_from(model: offers::Model) -> Result<Self, Self::Error> {
        Ok(Offer {
            id: OfferId(model.id),
            product_id: ProductId(model.product_id),
            buyer_id: UserId(model.buyer_id),
            seller_id: UserId(model.seller_id),
            quantity: model.quantity,
            price_cents: model.price_cents,
            counter_price_cents: model.counter_price_cents,
            message: model.message,
            status: model.status.parse().map_err(DomainError::Internal)?,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}
