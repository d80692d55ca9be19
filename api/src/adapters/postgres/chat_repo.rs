//! PostgreSQL adapter for ChatRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, NullOrdering};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::entities::{
    Conversation, ConversationId, Message, MessageId, NewConversation, NewMessage, ProductId,
    UserId,
};
use crate::domain::ports::ChatRepository;
use crate::entity::{conversations, messages};
use crate::error::DomainError;

/// PostgreSQL implementation of ChatRepository
pub struct PostgresChatRepository {
    db: DatabaseConnection,
}

impl PostgresChatRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn participant(user_id: &UserId) -> Condition {
    Condition::any()
        .add(conversations::Column::BuyerId.eq(user_id.0))
        .add(conversations::Column::SellerId.eq(user_id.0))
}

#[async_trait]
impl ChatRepository for PostgresChatRepository {
    async fn find_conversation(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, DomainError> {
        let result = conversations::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_conversation_between(
        &self,
        conversation: &NewConversation,
    ) -> Result<Option<Conversation>, DomainError> {
        let product = match conversation.product_id {
            Some(product_id) => conversations::Column::ProductId.eq(product_id.0),
            None => conversations::Column::ProductId.is_null(),
        };

        let result = conversations::Entity::find()
            .filter(conversations::Column::BuyerId.eq(conversation.buyer_id.0))
            .filter(conversations::Column::SellerId.eq(conversation.seller_id.0))
            .filter(product)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn create_conversation(
        &self,
        conversation: &NewConversation,
    ) -> Result<Conversation, DomainError> {
        let model = conversations::ActiveModel {
            id: Set(Uuid::new_v4()),
            buyer_id: Set(conversation.buyer_id.0),
            seller_id: Set(conversation.seller_id.0),
            product_id: Set(conversation.product_id.map(|p| p.0)),
            last_message_at: Set(None),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn list_conversations(
        &self,
        user_id: &UserId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Conversation>, DomainError> {
        let results = conversations::Entity::find()
            .filter(participant(user_id))
            .order_by_with_nulls(
                conversations::Column::LastMessageAt,
                Order::Desc,
                NullOrdering::Last,
            )
            .order_by_desc(conversations::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn list_messages(
        &self,
        conversation_id: &ConversationId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Message>, DomainError> {
        let results = messages::Entity::find()
            .filter(messages::Column::ConversationId.eq(conversation_id.0))
            .order_by_asc(messages::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn create_message(&self, message: &NewMessage) -> Result<Message, DomainError> {
        let now = Utc::now().fixed_offset();
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let result = messages::ActiveModel {
            id: Set(Uuid::new_v4()),
            conversation_id: Set(message.conversation_id.0),
            sender_id: Set(message.sender_id.0),
            body: Set(message.body.clone()),
            attachment_key: Set(message.attachment_key.clone()),
            read_at: Set(None),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        conversations::ActiveModel {
            id: Set(message.conversation_id.0),
            last_message_at: Set(Some(now)),
            ..Default::default()
        }
        .update(&txn)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn mark_read(
        &self,
        conversation_id: &ConversationId,
        reader: &UserId,
    ) -> Result<u64, DomainError> {
        let result = messages::Entity::update_many()
            .col_expr(
                messages::Column::ReadAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(messages::Column::ConversationId.eq(conversation_id.0))
            .filter(messages::Column::SenderId.ne(reader.0))
            .filter(messages::Column::ReadAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    async fn unread_count(&self, user_id: &UserId) -> Result<u64, DomainError> {
        let conversation_ids: Vec<Uuid> = conversations::Entity::find()
            .filter(participant(user_id))
            .select_only()
            .column(conversations::Column::Id)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if conversation_ids.is_empty() {
            return Ok(0);
        }

        messages::Entity::find()
            .filter(messages::Column::ConversationId.is_in(conversation_ids))
            .filter(messages::Column::SenderId.ne(user_id.0))
            .filter(messages::Column::ReadAt.is_null())
            .count(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))
    }
}

/// Convert SeaORM model to domain entity
impl From<conversations::Model> for Conversation {
    fn from(model: conversations::Model) -> Self {
        Conversation {
            id: ConversationId(model.id),
            buyer_id: UserId(model.buyer_id),
            seller_id: UserId(model.seller_id),
            product_id: model.product_id.map(ProductId),
            last_message_at: model.last_message_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Convert SeaORM model to domain entity
impl From<messages::Model> for Message {
    fn from(model: messages::Model) -> Self {
        Message {
            id: MessageId(model.id),
            conversation_id: ConversationId(model.conversation_id),
            sender_id: UserId(model.sender_id),
            body: model.body,
            attachment_key: model.attachment_key,
            read_at: model.read_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
