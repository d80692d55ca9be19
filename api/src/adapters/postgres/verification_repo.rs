//! PostgreSQL adapter for VerificationRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::domain::entities::{
    NewVerificationRequest, UserId, VerificationDecision, VerificationId,
    VerificationRequest, VerificationStatus,
};
use crate::domain::ports::VerificationRepository;
use crate::entity::verification_requests;
use crate::error::DomainError;

/// PostgreSQL implementation of VerificationRepository
pub struct PostgresVerificationRepository {
    db: DatabaseConnection,
}

impl PostgresVerificationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VerificationRepository for PostgresVerificationRepository {
    async fn find_by_id(
        &self,
        id: &VerificationId,
    ) -> Result<Option<VerificationRequest>, DomainError> {
        let result = verification_requests::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        result.map(VerificationRequest::try_from).transpose()
    }

    async fn find_pending_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<VerificationRequest>, DomainError> {
        let result = verification_requests::Entity::find()
            .filter(verification_requests::Column::UserId.eq(user_id.0))
            .filter(verification_requests::Column::Status.eq(VerificationStatus::Pending.to_string()))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        result.map(VerificationRequest::try_from).transpose()
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<VerificationRequest>, DomainError> {
        let results = verification_requests::Entity::find()
            .filter(verification_requests::Column::UserId.eq(user_id.0))
            .order_by_desc(verification_requests::Column::SubmittedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        results.into_iter().map(VerificationRequest::try_from).collect()
    }

    async fn list(
        &self,
        status: Option<VerificationStatus>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<VerificationRequest>, DomainError> {
        let mut query = verification_requests::Entity::find();
        if let Some(status) = status {
            query = query.filter(verification_requests::Column::Status.eq(status.to_string()));
        }

        let results = query
            .order_by_asc(verification_requests::Column::SubmittedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        results.into_iter().map(VerificationRequest::try_from).collect()
    }

    async fn create(
        &self,
        request: &NewVerificationRequest,
    ) -> Result<VerificationRequest, DomainError> {
        let model = verification_requests::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(request.user_id.0),
            document_type: Set(request.document_type.to_string()),
            document_keys: Set(serde_json::Value::from(request.document_keys.clone())),
            notes: Set(request.notes.clone()),
            status: Set(VerificationStatus::Pending.to_string()),
            reviewer_id: Set(None),
            review_notes: Set(None),
            submitted_at: Set(Utc::now().fixed_offset()),
            reviewed_at: Set(None),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        VerificationRequest::try_from(result)
    }

    async fn decide(
        &self,
        id: &VerificationId,
        decision: &VerificationDecision,
    ) -> Result<VerificationRequest, DomainError> {
        let result = verification_requests::Entity::update_many()
            .col_expr(
                verification_requests::Column::Status,
                Expr::value(decision.status.to_string()),
            )
            .col_expr(
                verification_requests::Column::ReviewerId,
                Expr::value(decision.reviewer_id.0),
            )
            .col_expr(
                verification_requests::Column::ReviewNotes,
                Expr::value(decision.review_notes.clone()),
            )
            .col_expr(
                verification_requests::Column::ReviewedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(verification_requests::Column::Id.eq(id.0))
            .filter(
                verification_requests::Column::Status.eq(VerificationStatus::Pending.to_string()),
            )
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Verification request {}", id)))?;
        if result.rows_affected == 0 {
            return Err(DomainError::Conflict(format!(
                "verification request is already {}",
                current.status
            )));
        }

        Ok(current)
    }

    async fn count_pending(&self) -> Result<u64, DomainError> {
        verification_requests::Entity::find()
            .filter(verification_requests::Column::Status.eq(VerificationStatus::Pending.to_string()))
            .count(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))
    }
}

/// Convert SeaORM model to domain entity
impl TryFrom<verification_requests::Model> for VerificationRequest {
    type Error = DomainError;

    fn try_from(model: verification_requests::Model) -> Result<Self, Self::Error> {
        Ok(VerificationRequest {
            id: VerificationId(model.id),
            user_id: UserId(model.user_id),
            document_type: model.document_type.parse().map_err(DomainError::Internal)?,
            document_keys: serde_json::from_value(model.document_keys)
                .map_err(|e| DomainError::Internal(e.to_string()))?,
            notes: model.notes,
            status: model.status.parse().map_err(DomainError::Internal)?,
            reviewer_id: model.reviewer_id.map(UserId),
            review_notes: model.review_notes,
            submitted_at: model.submitted_at.with_timezone(&Utc),
            reviewed_at: model.reviewed_at.map(|dt| dt.with_timezone(&Utc)),
        })
    }
}
