//! Chat service
//!
//! Buyer/seller conversations, optionally about a listing. Delivery is
//! request/response; the recipient is told about new messages through the
//! notification pipeline.

use std::sync::Arc;

use crate::domain::entities::{
    AssetPurpose, Conversation, ConversationId, Message, NewConversation, NewMessage,
    NotificationKind, OutgoingNotification, ProductId, User, UserId, MAX_MESSAGE_LEN,
};
use crate::domain::ports::{ChatRepository, Notify, ProductRepository, UserRepository};
use crate::error::AppError;

const MAX_PAGE: u64 = 100;
const PREVIEW_LEN: usize = 80;

pub struct ChatService<CR, UR, PR, N>
where
    CR: ChatRepository,
    UR: UserRepository,
    PR: ProductRepository,
    N: Notify,
{
    chats: Arc<CR>,
    users: Arc<UR>,
    products: Arc<PR>,
    notifier: Arc<N>,
}

impl<CR, UR, PR, N> ChatService<CR, UR, PR, N>
where
    CR: ChatRepository,
    UR: UserRepository,
    PR: ProductRepository,
    N: Notify,
{
    pub fn new(chats: Arc<CR>, users: Arc<UR>, products: Arc<PR>, notifier: Arc<N>) -> Self {
        Self {
            chats,
            users,
            products,
            notifier,
        }
    }

    /// Open a conversation with a seller, or return the one that already
    /// exists for the same seller and listing
    pub async fn start(
        &self,
        buyer: &User,
        seller_id: &UserId,
        product_id: Option<ProductId>,
    ) -> Result<Conversation, AppError> {
        if buyer.id == *seller_id {
            return Err(AppError::BadRequest(
                "You cannot start a conversation with yourself".to_string(),
            ));
        }

        let seller = self
            .users
            .find_by_id(seller_id)
            .await?
            .filter(|u| !u.is_banned)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", seller_id)))?;

        if let Some(product_id) = &product_id {
            let product = self
                .products
                .find_by_id(product_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;
            if product.seller_id != seller.id {
                return Err(AppError::BadRequest(
                    "That product belongs to a different seller".to_string(),
                ));
            }
        }

        let new = NewConversation {
            buyer_id: buyer.id,
            seller_id: seller.id,
            product_id,
        };
        if let Some(existing) = self.chats.find_conversation_between(&new).await? {
            return Ok(existing);
        }

        let conversation = self.chats.create_conversation(&new).await?;
        tracing::debug!(conversation_id = %conversation.id, "Conversation started");
        Ok(conversation)
    }

    pub async fn list(
        &self,
        user_id: &UserId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Conversation>, AppError> {
        Ok(self
            .chats
            .list_conversations(user_id, limit.clamp(1, MAX_PAGE), offset)
            .await?)
    }

    async fn participant_conversation(
        &self,
        user_id: &UserId,
        id: &ConversationId,
    ) -> Result<Conversation, AppError> {
        self.chats
            .find_conversation(id)
            .await?
            .filter(|c| c.is_participant(user_id))
            .ok_or_else(|| AppError::NotFound(format!("Conversation {} not found", id)))
    }

    pub async fn messages(
        &self,
        user_id: &UserId,
        id: &ConversationId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Message>, AppError> {
        self.participant_conversation(user_id, id).await?;
        Ok(self
            .chats
            .list_messages(id, limit.clamp(1, MAX_PAGE), offset)
            .await?)
    }

    pub async fn send(
        &self,
        sender: &User,
        id: &ConversationId,
        body: &str,
        attachment_key: Option<String>,
    ) -> Result<Message, AppError> {
        let conversation = self.participant_conversation(&sender.id, id).await?;

        let body = body.trim();
        if body.is_empty() && attachment_key.is_none() {
            return Err(AppError::BadRequest("Message cannot be empty".to_string()));
        }
        if body.chars().count() > MAX_MESSAGE_LEN {
            return Err(AppError::BadRequest(format!(
                "Message must be at most {} characters",
                MAX_MESSAGE_LEN
            )));
        }
        if let Some(key) = &attachment_key {
            if !AssetPurpose::Message.is_owned_by(key, &sender.id) {
                return Err(AppError::BadRequest(
                    "attachment_key must be one of your message uploads".to_string(),
                ));
            }
        }

        let message = self
            .chats
            .create_message(&NewMessage {
                conversation_id: conversation.id,
                sender_id: sender.id,
                body: body.to_string(),
                attachment_key,
            })
            .await?;

        let preview: String = if message.body.is_empty() {
            "Sent an attachment".to_string()
        } else {
            message.body.chars().take(PREVIEW_LEN).collect()
        };
        self.notifier
            .notify_best_effort(
                &conversation.other_participant(&sender.id),
                OutgoingNotification::new(
                    NotificationKind::NewMessage,
                    format!("Message from {}", sender.full_name),
                    preview,
                )
                .with_data(serde_json::json!({ "conversation_id": conversation.id })),
            )
            .await;

        Ok(message)
    }

    /// Mark the other participant's messages as read
    pub async fn mark_read(&self, user_id: &UserId, id: &ConversationId) -> Result<u64, AppError> {
        self.participant_conversation(user_id, id).await?;
        Ok(self.chats.mark_read(id, user_id).await?)
    }

    pub async fn unread_count(&self, user_id: &UserId) -> Result<u64, AppError> {
        Ok(self.chats.unread_count(user_id).await?)
    }
}
