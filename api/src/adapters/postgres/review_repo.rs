//! PostgreSQL adapter for ReviewRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::domain::entities::{NewReview, OfferId, Review, ReviewId, UserId};
use crate::domain::ports::ReviewRepository;
use crate::entity::reviews;
use crate::error::DomainError;

/// PostgreSQL implementation of ReviewRepository
pub struct PostgresReviewRepository {
    db: DatabaseConnection,
}

impl PostgresReviewRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReviewRepository for PostgresReviewRepository {
    async fn find_by_id(&self, id: &ReviewId) -> Result<Option<Review>, DomainError> {
        let result = reviews::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_by_offer_and_reviewer(
        &self,
        offer_id: &OfferId,
        reviewer_id: &UserId,
    ) -> Result<Option<Review>, DomainError> {
        let result = reviews::Entity::find()
            .filter(reviews::Column::OfferId.eq(offer_id.0))
            .filter(reviews::Column::ReviewerId.eq(reviewer_id.0))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn list_for_user(
        &self,
        reviewee_id: &UserId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Review>, DomainError> {
        let results = reviews::Entity::find()
            .filter(reviews::Column::RevieweeId.eq(reviewee_id.0))
            .order_by_desc(reviews::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn ratings_for_user(&self, reviewee_id: &UserId) -> Result<Vec<i16>, DomainError> {
        reviews::Entity::find()
            .filter(reviews::Column::RevieweeId.eq(reviewee_id.0))
            .select_only()
            .column(reviews::Column::Rating)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))
    }

    async fn create(&self, review: &NewReview) -> Result<Review, DomainError> {
        let model = reviews::ActiveModel {
            id: Set(Uuid::new_v4()),
            offer_id: Set(review.offer_id.0),
            reviewer_id: Set(review.reviewer_id.0),
            reviewee_id: Set(review.reviewee_id.0),
            rating: Set(review.rating),
            comment: Set(review.comment.clone()),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn delete(&self, id: &ReviewId) -> Result<(), DomainError> {
        reviews::Entity::delete_by_id(id.0)
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(())
    }
}

/// Convert SeaORM model to domain entity
impl From<reviews::Model> for Review {
    fn from(model: reviews::Model) -> Self {
        Review {
            id: ReviewId(model.id),
            offer_id: OfferId(model.offer_id),
            reviewer_id: UserId(model.reviewer_id),
            reviewee_id: UserId(model.reviewee_id),
            rating: model.rating,
            comment: model.comment,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
