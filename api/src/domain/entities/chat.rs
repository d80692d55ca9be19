//! Conversation and message entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::product::ProductId;
use super::user::UserId;

/// Maximum length of a chat message body
pub const MAX_MESSAGE_LEN: usize = 2000;

/// Unique identifier for a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub Uuid);

impl From<Uuid> for ConversationId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl From<Uuid> for MessageId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A buyer/seller thread, optionally about one listing
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub product_id: Option<ProductId>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn is_participant(&self, user_id: &UserId) -> bool {
        self.buyer_id == *user_id || self.seller_id == *user_id
    }

    /// The other participant
    pub fn other_participant(&self, user_id: &UserId) -> UserId {
        if self.buyer_id == *user_id {
            self.seller_id
        } else {
            self.buyer_id
        }
    }
}

/// Data needed to open a conversation
#[derive(Debug, Clone)]
pub struct NewConversation {
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub product_id: Option<ProductId>,
}

/// A single chat message
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub body: String,
    /// S3 key of an attached image
    pub attachment_key: Option<String>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Data needed to post a message
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub body: String,
    pub attachment_key: Option<String>,
}
