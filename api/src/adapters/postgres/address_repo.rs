//! PostgreSQL adapter for AddressRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::entities::{Address, AddressId, AddressInput, NewAddress, UserId};
use crate::domain::ports::AddressRepository;
use crate::entity::addresses;
use crate::error::DomainError;

/// PostgreSQL implementation of AddressRepository
pub struct PostgresAddressRepository {
    db: DatabaseConnection,
}

impl PostgresAddressRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AddressRepository for PostgresAddressRepository {
    async fn find_by_id(&self, id: &AddressId) -> Result<Option<Address>, DomainError> {
        let result = addresses::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Address>, DomainError> {
        let results = addresses::Entity::find()
            .filter(addresses::Column::UserId.eq(user_id.0))
            .order_by_desc(addresses::Column::IsDefault)
            .order_by_asc(addresses::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn count_by_user(&self, user_id: &UserId) -> Result<u64, DomainError> {
        addresses::Entity::find()
            .filter(addresses::Column::UserId.eq(user_id.0))
            .count(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))
    }

    async fn create(&self, address: &NewAddress) -> Result<Address, DomainError> {
        let input = &address.input;
        let model = addresses::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(address.user_id.0),
            label: Set(input.label.clone()),
            line1: Set(input.line1.clone()),
            line2: Set(input.line2.clone()),
            city: Set(input.city.clone()),
            region: Set(input.region.clone()),
            postal_code: Set(input.postal_code.clone()),
            country: Set(input.country.clone()),
            is_default: Set(address.is_default),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn update(&self, id: &AddressId, input: &AddressInput) -> Result<Address, DomainError> {
        let result = addresses::ActiveModel {
            id: Set(id.0),
            label: Set(input.label.clone()),
            line1: Set(input.line1.clone()),
            line2: Set(input.line2.clone()),
            city: Set(input.city.clone()),
            region: Set(input.region.clone()),
            postal_code: Set(input.postal_code.clone()),
            country: Set(input.country.clone()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn delete(&self, id: &AddressId) -> Result<(), DomainError> {
        addresses::Entity::delete_by_id(id.0)
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(())
    }

    async fn set_default(&self, user_id: &UserId, id: &AddressId) -> Result<(), DomainError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        addresses::Entity::update_many()
            .col_expr(addresses::Column::IsDefault, Expr::value(false))
            .filter(addresses::Column::UserId.eq(user_id.0))
            .exec(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let updated = addresses::Entity::update_many()
            .col_expr(addresses::Column::IsDefault, Expr::value(true))
            .filter(addresses::Column::Id.eq(id.0))
            .filter(addresses::Column::UserId.eq(user_id.0))
            .exec(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if updated.rows_affected == 0 {
            return Err(DomainError::NotFound(format!("Address {}", id)));
        }

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))
    }
}

/// Convert SeaORM model to domain entity
impl From<addresses::Model> for Address {
    fn from(model: addresses::Model) -> Self {
        Address {
            id: AddressId(model.id),
            user_id: UserId(model.user_id),
            label: model.label,
            line1: model.line1,
            line2: model.line2,
            city: model.city,
            region: model.region,
            postal_code: model.postal_code,
            country: model.country,
            is_default: model.is_default,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
