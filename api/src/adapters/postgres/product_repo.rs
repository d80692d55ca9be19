//! PostgreSQL adapter for ProductRepository
//!
//! Search is built from a typed `ProductQuery` into a SeaORM `Condition`, so
//! every user-supplied value is bound as a parameter.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::domain::entities::{
    NewProduct, Product, ProductId, ProductQuery, ProductSort, ProductStatus, ProductUpdate,
    UserId,
};
use crate::domain::ports::ProductRepository;
use crate::entity::products;
use crate::error::DomainError;

/// PostgreSQL implementation of ProductRepository
pub struct PostgresProductRepository {
    db: DatabaseConnection,
}

impl PostgresProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Case-insensitive substring match on a text column
fn lower_like(column: products::Column, needle: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(format!("%{}%", needle.to_lowercase()))
}

fn search_condition(query: &ProductQuery) -> Condition {
    let mut cond = Condition::all();

    if let Some(status) = query.status {
        cond = cond.add(products::Column::Status.eq(status.to_string()));
    }
    if let Some(text) = &query.text {
        cond = cond.add(
            Condition::any()
                .add(lower_like(products::Column::Title, text))
                .add(lower_like(products::Column::Description, text)),
        );
    }
    if let Some(category) = &query.category {
        cond = cond.add(
            Expr::expr(Func::lower(Expr::col(products::Column::Category)))
                .eq(category.to_lowercase()),
        );
    }
    if let Some(min) = query.min_price_cents {
        cond = cond.add(products::Column::PriceCents.gte(min));
    }
    if let Some(max) = query.max_price_cents {
        cond = cond.add(products::Column::PriceCents.lte(max));
    }
    if let Some(organic) = query.organic {
        cond = cond.add(products::Column::Organic.eq(organic));
    }
    if let Some(seller_id) = query.seller_id {
        cond = cond.add(products::Column::SellerId.eq(seller_id.0));
    }
    if let Some(location) = &query.location {
        cond = cond.add(lower_like(products::Column::Location, location));
    }

    cond
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, DomainError> {
        let result = products::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        result.map(Product::try_from).transpose()
    }

    async fn search(&self, query: &ProductQuery) -> Result<Vec<Product>, DomainError> {
        let select = products::Entity::find().filter(search_condition(query));
        let select = match query.sort {
            ProductSort::Newest => select.order_by_desc(products::Column::CreatedAt),
            ProductSort::PriceAsc => select
                .order_by_asc(products::Column::PriceCents)
                .order_by_desc(products::Column::CreatedAt),
            ProductSort::PriceDesc => select
                .order_by_desc(products::Column::PriceCents)
                .order_by_desc(products::Column::CreatedAt),
        };

        let results = select
            .offset(query.offset)
            .limit(query.limit)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        results.into_iter().map(Product::try_from).collect()
    }

    async fn create(&self, product: &NewProduct) -> Result<Product, DomainError> {
        let now = Utc::now().fixed_offset();

        let model = products::ActiveModel {
            id: Set(Uuid::new_v4()),
            seller_id: Set(product.seller_id.0),
            title: Set(product.title.clone()),
            description: Set(product.description.clone()),
            category: Set(product.category.clone()),
            unit: Set(product.unit.to_string()),
            price_cents: Set(product.price_cents),
            quantity_available: Set(product.quantity_available),
            location: Set(product.location.clone()),
            organic: Set(product.organic),
            harvest_date: Set(product.harvest_date),
            image_keys: Set(serde_json::Value::from(product.image_keys.clone())),
            status: Set(product.status.to_string()),
            rejection_reason: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Product::try_from(result)
    }

    async fn update(
        &self,
        id: &ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, DomainError> {
        let mut model = products::ActiveModel {
            id: Set(id.0),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        };
        if let Some(title) = &update.title {
            model.title = Set(title.clone());
        }
        if let Some(description) = &update.description {
            model.description = Set(Some(description.clone()));
        }
        if let Some(category) = &update.category {
            model.category = Set(category.clone());
        }
        if let Some(unit) = update.unit {
            model.unit = Set(unit.to_string());
        }
        if let Some(price_cents) = update.price_cents {
            model.price_cents = Set(price_cents);
        }
        if let Some(quantity) = update.quantity_available {
            model.quantity_available = Set(quantity);
        }
        if let Some(location) = &update.location {
            model.location = Set(Some(location.clone()));
        }
        if let Some(organic) = update.organic {
            model.organic = Set(organic);
        }
        if let Some(harvest_date) = update.harvest_date {
            model.harvest_date = Set(Some(harvest_date));
        }
        if let Some(keys) = &update.image_keys {
            model.image_keys = Set(serde_json::Value::from(keys.clone()));
        }
        if let Some(status) = update.status {
            model.status = Set(status.to_string());
        }
        if let Some(reason) = &update.rejection_reason {
            model.rejection_reason = Set(reason.clone());
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Product::try_from(result)
    }

    async fn delete(&self, id: &ProductId) -> Result<(), DomainError> {
        products::Entity::delete_by_id(id.0)
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(())
    }

    async fn count_by_status(&self) -> Result<Vec<(ProductStatus, u64)>, DomainError> {
        let rows: Vec<(String, i64)> = products::Entity::find()
            .select_only()
            .column(products::Column::Status)
            .column_as(Expr::col(products::Column::Id).count(), "count")
            .group_by(products::Column::Status)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|(status, count)| {
                let status: ProductStatus = status.parse().map_err(DomainError::Internal)?;
                Ok((status, count as u64))
            })
            .collect()
    }
}

/// Convert SeaORM model to domain entity
impl TryFrom<products::Model> for Product {
    type Error = DomainError;

    fn try_from(model: products::Model) -> Result<Self, Self::Error> {
        Ok(Product {
            id: ProductId(model.id),
            seller_id: UserId(model.seller_id),
            title: model.title,
            description: model.description,
            category: model.category,
            unit: model.unit.parse().map_err(DomainError::Internal)?,
            price_cents: model.price_cents,
            quantity_available: model.quantity_available,
            location: model.location,
            organic: model.organic,
            harvest_date: model.harvest_date,
            image_keys: serde_json::from_value(model.image_keys)
                .map_err(|e| DomainError::Internal(e.to_string()))?,
            status: model.status.parse().map_err(DomainError::Internal)?,
            rejection_reason: model.rejection_reason,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}
