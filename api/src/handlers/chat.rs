//! Chat handlers
//!
//! Buyer/seller conversations and their messages.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::CdnUrls;
use crate::domain::entities::{
    Conversation, ConversationId, Message, ProductId, User, UserId,
};
use crate::error::AppError;
use crate::AppState;

use super::{CountResponse, Pagination};

#[derive(Debug, Deserialize)]
pub struct StartConversationRequest {
    pub seller_id: Uuid,
    pub product_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub body: String,
    pub attachment_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub product_id: Option<String>,
    pub last_message_at: Option<String>,
    pub created_at: String,
}

impl From<Conversation> for ConversationResponse {
    fn from(c: Conversation) -> Self {
        Self {
            id: c.id.to_string(),
            buyer_id: c.buyer_id.to_string(),
            seller_id: c.seller_id.to_string(),
            product_id: c.product_id.map(|p| p.to_string()),
            last_message_at: c.last_message_at.map(|t| t.to_rfc3339()),
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub body: String,
    pub attachment_key: Option<String>,
    pub attachment_url: Option<String>,
    pub read_at: Option<String>,
    pub created_at: String,
}

impl MessageResponse {
    pub fn new(m: Message, urls: &CdnUrls) -> Self {
        Self {
            id: m.id.to_string(),
            conversation_id: m.conversation_id.to_string(),
            sender_id: m.sender_id.to_string(),
            body: m.body,
            attachment_url: m.attachment_key.as_deref().map(|k| urls.url(k)),
            attachment_key: m.attachment_key,
            read_at: m.read_at.map(|t| t.to_rfc3339()),
            created_at: m.created_at.to_rfc3339(),
        }
    }
}

/// POST /conversations
///
/// Returns the existing conversation when one already covers the same
/// buyer, seller and product.
pub async fn start_conversation(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<StartConversationRequest>,
) -> Result<Json<ConversationResponse>, AppError> {
    let conversation = state
        .chat_service
        .start(
            &user,
            &UserId(request.seller_id),
            request.product_id.map(ProductId),
        )
        .await?;
    Ok(Json(conversation.into()))
}

/// GET /conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<ConversationResponse>>, AppError> {
    let conversations = state
        .chat_service
        .list(&user.id, page.limit, page.offset)
        .await?;
    Ok(Json(conversations.into_iter().map(Into::into).collect()))
}

/// GET /conversations/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<CountResponse>, AppError> {
    let count = state.chat_service.unread_count(&user.id).await?;
    Ok(Json(CountResponse { count }))
}

/// GET /conversations/:id/messages
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    let messages = state
        .chat_service
        .messages(&user.id, &ConversationId(id), page.limit, page.offset)
        .await?;
    let urls = state.asset_service.urls();
    Ok(Json(
        messages
            .into_iter()
            .map(|m| MessageResponse::new(m, urls))
            .collect(),
    ))
}

/// POST /conversations/:id/messages
pub async fn send_message(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let message = state
        .chat_service
        .send(
            &user,
            &ConversationId(id),
            &request.body,
            request.attachment_key,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(message, state.asset_service.urls())),
    ))
}

/// POST /conversations/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<CountResponse>, AppError> {
    let count = state
        .chat_service
        .mark_read(&user.id, &ConversationId(id))
        .await?;
    Ok(Json(CountResponse { count }))
}
