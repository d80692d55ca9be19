//! Repository port traits
//!
//! These traits define the interface for data persistence.
//! Implementations are provided by adapters (e.g., PostgreSQL).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{
    Address, AddressId, AddressInput, ChannelCost, Conversation, ConversationId, Message,
    NewAddress, NewConversation, NewMessage, NewNotification, NewOffer, NewProduct, NewReview,
    NewUser, NewVerificationRequest, Notification, NotificationId, NotificationPreferences, Offer,
    OfferFilter, OfferId, OfferStatus, PasswordReset, Product, ProductId, ProductQuery,
    ProductStatus, ProductUpdate, ProfileUpdate, Review, ReviewId, Role, User, UserFilter, UserId,
    VerificationDecision, VerificationId, VerificationRequest, VerificationStatus,
};
use crate::error::DomainError;

/// Repository for User entities
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Find a user by (lowercased) email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Create a new user
    async fn create(&self, user: &NewUser) -> Result<User, DomainError>;

    /// Apply a partial profile update
    async fn update_profile(&self, id: &UserId, update: &ProfileUpdate)
        -> Result<User, DomainError>;

    /// Replace the password hash
    async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<(), DomainError>;

    /// Set or clear the push device token
    async fn set_push_token(&self, id: &UserId, token: Option<&str>) -> Result<(), DomainError>;

    /// Stamp the last login time
    async fn record_login(&self, id: &UserId) -> Result<(), DomainError>;

    /// Store or clear a pending password reset
    async fn set_password_reset(
        &self,
        id: &UserId,
        reset: Option<&PasswordReset>,
    ) -> Result<(), DomainError>;

    /// Get the pending password reset, if any
    async fn get_password_reset(&self, id: &UserId) -> Result<Option<PasswordReset>, DomainError>;

    /// Count a wrong code against the pending reset. Returns the failures so
    /// far; storing or clearing a reset starts the count over.
    async fn record_reset_failure(&self, id: &UserId) -> Result<u32, DomainError>;

    async fn set_verified(&self, id: &UserId, verified: bool) -> Result<(), DomainError>;

    async fn set_banned(&self, id: &UserId, banned: bool) -> Result<(), DomainError>;

    async fn set_role(&self, id: &UserId, role: Role) -> Result<(), DomainError>;

    /// Admin listing with filters and pagination
    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, DomainError>;

    /// All users with a role
    async fn find_by_role(&self, role: Role) -> Result<Vec<User>, DomainError>;

    /// IDs of every non-banned user, optionally limited to one role
    async fn find_active_ids(&self, role: Option<Role>) -> Result<Vec<UserId>, DomainError>;

    /// Number of users per role
    async fn count_by_role(&self) -> Result<Vec<(Role, u64)>, DomainError>;
}

/// Repository for saved addresses
#[async_trait]
pub trait AddressRepository: Send + Sync {
    async fn find_by_id(&self, id: &AddressId) -> Result<Option<Address>, DomainError>;

    /// Addresses for a user, default first
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Address>, DomainError>;

    async fn count_by_user(&self, user_id: &UserId) -> Result<u64, DomainError>;

    async fn create(&self, address: &NewAddress) -> Result<Address, DomainError>;

    async fn update(&self, id: &AddressId, input: &AddressInput) -> Result<Address, DomainError>;

    async fn delete(&self, id: &AddressId) -> Result<(), DomainError>;

    /// Make one address the default, clearing the flag on the others
    async fn set_default(&self, user_id: &UserId, id: &AddressId) -> Result<(), DomainError>;
}

/// Repository for product listings
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, DomainError>;

    /// Parameterized search
    async fn search(&self, query: &ProductQuery) -> Result<Vec<Product>, DomainError>;

    async fn create(&self, product: &NewProduct) -> Result<Product, DomainError>;

    async fn update(&self, id: &ProductId, update: &ProductUpdate)
        -> Result<Product, DomainError>;

    async fn delete(&self, id: &ProductId) -> Result<(), DomainError>;

    /// Number of listings per status
    async fn count_by_status(&self) -> Result<Vec<(ProductStatus, u64)>, DomainError>;
}

/// Repository for offers
#[async_trait]
pub trait OfferRepository: Send + Sync {
    async fn find_by_id(&self, id: &OfferId) -> Result<Option<Offer>, DomainError>;

    async fn list(&self, filter: &OfferFilter) -> Result<Vec<Offer>, DomainError>;

    async fn create(&self, offer: &NewOffer) -> Result<Offer, DomainError>;

    /// Move an offer from `from` to `status` (and set the counter price, for
    /// counters). Fails with `Conflict` if the offer is no longer in `from`.
    async fn update_status(
        &self,
        id: &OfferId,
        from: OfferStatus,
        status: OfferStatus,
        counter_price_cents: Option<i64>,
    ) -> Result<Offer, DomainError>;

    /// Mark an offer accepted and reserve its quantity from the product's
    /// stock in one transaction. Fails with `Conflict` if the offer is no
    /// longer in `from` or stock is short.
    async fn accept(&self, id: &OfferId, from: OfferStatus) -> Result<Offer, DomainError>;

    /// Offers ever made on a product
    async fn count_for_product(&self, product_id: &ProductId) -> Result<u64, DomainError>;

    /// Number of offers per status
    async fn count_by_status(&self) -> Result<Vec<(OfferStatus, u64)>, DomainError>;
}

/// Repository for conversations and messages
#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn find_conversation(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, DomainError>;

    /// Existing thread between the same buyer, seller and product
    async fn find_conversation_between(
        &self,
        conversation: &NewConversation,
    ) -> Result<Option<Conversation>, DomainError>;

    async fn create_conversation(
        &self,
        conversation: &NewConversation,
    ) -> Result<Conversation, DomainError>;

    /// Conversations a user takes part in, most recent activity first
    async fn list_conversations(
        &self,
        user_id: &UserId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Conversation>, DomainError>;

    /// Messages in a conversation, oldest first
    async fn list_messages(
        &self,
        conversation_id: &ConversationId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Message>, DomainError>;

    /// Store a message and bump the conversation's last activity
    async fn create_message(&self, message: &NewMessage) -> Result<Message, DomainError>;

    /// Mark messages not sent by `reader` as read; returns how many changed
    async fn mark_read(
        &self,
        conversation_id: &ConversationId,
        reader: &UserId,
    ) -> Result<u64, DomainError>;

    /// Unread messages addressed to a user across all conversations
    async fn unread_count(&self, user_id: &UserId) -> Result<u64, DomainError>;
}

/// Repository for reviews
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn find_by_id(&self, id: &ReviewId) -> Result<Option<Review>, DomainError>;

    async fn find_by_offer_and_reviewer(
        &self,
        offer_id: &OfferId,
        reviewer_id: &UserId,
    ) -> Result<Option<Review>, DomainError>;

    /// Reviews about a user, newest first
    async fn list_for_user(
        &self,
        reviewee_id: &UserId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Review>, DomainError>;

    /// Every rating a user has received
    async fn ratings_for_user(&self, reviewee_id: &UserId) -> Result<Vec<i16>, DomainError>;

    async fn create(&self, review: &NewReview) -> Result<Review, DomainError>;

    async fn delete(&self, id: &ReviewId) -> Result<(), DomainError>;
}

/// Repository for verification requests
#[async_trait]
pub trait VerificationRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: &VerificationId,
    ) -> Result<Option<VerificationRequest>, DomainError>;

    async fn find_pending_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<VerificationRequest>, DomainError>;

    /// A user's requests, newest first
    async fn list_by_user(&self, user_id: &UserId)
        -> Result<Vec<VerificationRequest>, DomainError>;

    /// Admin queue, oldest first
    async fn list(
        &self,
        status: Option<VerificationStatus>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<VerificationRequest>, DomainError>;

    async fn create(
        &self,
        request: &NewVerificationRequest,
    ) -> Result<VerificationRequest, DomainError>;

    /// Record an admin decision on a pending request. Fails with `Conflict`
    /// if the request was already decided.
    async fn decide(
        &self,
        id: &VerificationId,
        decision: &VerificationDecision,
    ) -> Result<VerificationRequest, DomainError>;

    async fn count_pending(&self) -> Result<u64, DomainError>;
}

/// Repository for notifications (inbox and delivery cost log)
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &NewNotification) -> Result<Notification, DomainError>;

    /// A user's notifications, newest first
    async fn list_for_user(
        &self,
        user_id: &UserId,
        unread_only: bool,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Notification>, DomainError>;

    async fn unread_count(&self, user_id: &UserId) -> Result<u64, DomainError>;

    /// Mark one notification read; false if it doesn't belong to the user
    async fn mark_read(&self, id: &NotificationId, user_id: &UserId)
        -> Result<bool, DomainError>;

    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, DomainError>;

    /// Count and estimated spend per channel since a point in time
    async fn cost_summary(&self, since: DateTime<Utc>) -> Result<Vec<ChannelCost>, DomainError>;
}

/// Repository for per-user channel preferences
#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    async fn get(&self, user_id: &UserId) -> Result<Option<NotificationPreferences>, DomainError>;

    async fn upsert(
        &self,
        user_id: &UserId,
        preferences: &NotificationPreferences,
    ) -> Result<(), DomainError>;
}
