//! Mock implementations of port traits
//!
//! These are in-memory implementations that can be configured for testing.
//! They store data in memory and allow tests to verify behavior.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::domain::entities::{
    Address, AddressId, AddressInput, Channel, ChannelCost, Conversation, ConversationId, Message,
    MessageId, NewAddress, NewConversation, NewMessage, NewNotification, NewOffer, NewProduct,
    NewReview, NewUser, NewVerificationRequest, Notification, NotificationId,
    NotificationPreferences, Offer, OfferFilter, OfferId, OfferStatus, OutgoingNotification,
    PasswordReset, Product, ProductId, ProductQuery, ProductSort, ProductStatus, ProductUpdate,
    ProfileUpdate, Review, ReviewId, Role, User, UserFilter, UserId, VerificationDecision,
    VerificationId, VerificationRequest, VerificationStatus,
};
use crate::domain::ports::{
    AddressRepository, ChatRepository, EmailSender, Notify, NotificationRepository, ObjectStore,
    OfferRepository, PreferenceRepository, ProductRepository, PushSender, ReviewRepository,
    SmsGateway, UserRepository, VerificationRepository,
};
use crate::error::{DeliveryError, DomainError, StorageError};

/// Apply `offset` then `limit` the way the SQL adapters do
fn page<T>(items: impl Iterator<Item = T>, limit: u64, offset: u64) -> Vec<T> {
    items.skip(offset as usize).take(limit as usize).collect()
}

// ============================================================================
// In-Memory User Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    resets: Arc<RwLock<HashMap<UserId, PasswordReset>>>,
    reset_failures: Arc<RwLock<HashMap<UserId, u32>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a user for testing
    pub fn with_user(self, user: User) -> Self {
        self.insert(user);
        self
    }

    /// Add a user after construction
    pub fn insert(&self, user: User) {
        self.users.write().unwrap().insert(user.id, user);
    }

    fn modify(&self, id: &UserId, f: impl FnOnce(&mut User)) -> Result<User, DomainError> {
        let mut users = self.users.write().unwrap();
        let user = users
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("User {} not found", id)))?;
        f(user);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        Ok(self.users.read().unwrap().get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let email = email.to_lowercase();
        let users = self.users.read().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, new: &NewUser) -> Result<User, DomainError> {
        let mut users = self.users.write().unwrap();
        if users.values().any(|u| u.email == new.email) {
            return Err(DomainError::AlreadyExists(format!(
                "User with email {} already exists",
                new.email
            )));
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            full_name: new.full_name.clone(),
            password_hash: new.password_hash.clone(),
            role: new.role,
            is_verified: false,
            is_banned: false,
            avatar_key: None,
            bio: None,
            location: None,
            push_token: None,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<User, DomainError> {
        self.modify(id, |user| {
            if let Some(name) = &update.full_name {
                user.full_name = name.clone();
            }
            if let Some(phone) = &update.phone {
                user.phone = Some(phone.clone());
            }
            if let Some(bio) = &update.bio {
                user.bio = Some(bio.clone());
            }
            if let Some(location) = &update.location {
                user.location = Some(location.clone());
            }
            if let Some(key) = &update.avatar_key {
                user.avatar_key = Some(key.clone());
            }
        })
    }

    async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<(), DomainError> {
        self.modify(id, |user| user.password_hash = password_hash.to_string())?;
        Ok(())
    }

    async fn set_push_token(&self, id: &UserId, token: Option<&str>) -> Result<(), DomainError> {
        self.modify(id, |user| user.push_token = token.map(str::to_string))?;
        Ok(())
    }

    async fn record_login(&self, id: &UserId) -> Result<(), DomainError> {
        self.modify(id, |user| user.last_login_at = Some(Utc::now()))?;
        Ok(())
    }

    async fn set_password_reset(
        &self,
        id: &UserId,
        reset: Option<&PasswordReset>,
    ) -> Result<(), DomainError> {
        self.reset_failures.write().unwrap().remove(id);
        let mut resets = self.resets.write().unwrap();
        match reset {
            Some(reset) => {
                resets.insert(*id, reset.clone());
            }
            None => {
                resets.remove(id);
            }
        }
        Ok(())
    }

    async fn get_password_reset(&self, id: &UserId) -> Result<Option<PasswordReset>, DomainError> {
        Ok(self.resets.read().unwrap().get(id).cloned())
    }

    async fn record_reset_failure(&self, id: &UserId) -> Result<u32, DomainError> {
        let mut failures = self.reset_failures.write().unwrap();
        let count = failures.entry(*id).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn set_verified(&self, id: &UserId, verified: bool) -> Result<(), DomainError> {
        self.modify(id, |user| user.is_verified = verified)?;
        Ok(())
    }

    async fn set_banned(&self, id: &UserId, banned: bool) -> Result<(), DomainError> {
        self.modify(id, |user| user.is_banned = banned)?;
        Ok(())
    }

    async fn set_role(&self, id: &UserId, role: Role) -> Result<(), DomainError> {
        self.modify(id, |user| user.role = role)?;
        Ok(())
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, DomainError> {
        let users = self.users.read().unwrap();
        let needle = filter.search.as_ref().map(|s| s.to_lowercase());
        let mut matched: Vec<User> = users
            .values()
            .filter(|u| filter.role.map_or(true, |r| u.role == r))
            .filter(|u| filter.banned.map_or(true, |b| u.is_banned == b))
            .filter(|u| {
                needle.as_ref().map_or(true, |n| {
                    u.full_name.to_lowercase().contains(n) || u.email.contains(n)
                })
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(matched.into_iter(), filter.limit, filter.offset))
    }

    async fn find_by_role(&self, role: Role) -> Result<Vec<User>, DomainError> {
        let users = self.users.read().unwrap();
        let mut matched: Vec<User> = users.values().filter(|u| u.role == role).cloned().collect();
        matched.sort_by_key(|u| u.created_at);
        Ok(matched)
    }

    async fn find_active_ids(&self, role: Option<Role>) -> Result<Vec<UserId>, DomainError> {
        let users = self.users.read().unwrap();
        Ok(users
            .values()
            .filter(|u| !u.is_banned && role.map_or(true, |r| u.role == r))
            .map(|u| u.id)
            .collect())
    }

    async fn count_by_role(&self) -> Result<Vec<(Role, u64)>, DomainError> {
        let users = self.users.read().unwrap();
        Ok(Role::ALL
            .iter()
            .map(|role| (*role, users.values().filter(|u| u.role == *role).count() as u64))
            .filter(|(_, count)| *count > 0)
            .collect())
    }
}

// ============================================================================
// In-Memory Address Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryAddressRepository {
    addresses: Arc<RwLock<Vec<Address>>>,
}

impl InMemoryAddressRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AddressRepository for InMemoryAddressRepository {
    async fn find_by_id(&self, id: &AddressId) -> Result<Option<Address>, DomainError> {
        let addresses = self.addresses.read().unwrap();
        Ok(addresses.iter().find(|a| a.id == *id).cloned())
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Address>, DomainError> {
        let addresses = self.addresses.read().unwrap();
        let mut owned: Vec<Address> = addresses
            .iter()
            .filter(|a| a.user_id == *user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(owned)
    }

    async fn count_by_user(&self, user_id: &UserId) -> Result<u64, DomainError> {
        let addresses = self.addresses.read().unwrap();
        Ok(addresses.iter().filter(|a| a.user_id == *user_id).count() as u64)
    }

    async fn create(&self, new: &NewAddress) -> Result<Address, DomainError> {
        let address = Address {
            id: AddressId(Uuid::new_v4()),
            user_id: new.user_id,
            label: new.input.label.clone(),
            line1: new.input.line1.clone(),
            line2: new.input.line2.clone(),
            city: new.input.city.clone(),
            region: new.input.region.clone(),
            postal_code: new.input.postal_code.clone(),
            country: new.input.country.clone(),
            is_default: new.is_default,
            created_at: Utc::now(),
        };
        self.addresses.write().unwrap().push(address.clone());
        Ok(address)
    }

    async fn update(&self, id: &AddressId, input: &AddressInput) -> Result<Address, DomainError> {
        let mut addresses = self.addresses.write().unwrap();
        let address = addresses
            .iter_mut()
            .find(|a| a.id == *id)
            .ok_or_else(|| DomainError::NotFound(format!("Address {} not found", id)))?;
        address.label = input.label.clone();
        address.line1 = input.line1.clone();
        address.line2 = input.line2.clone();
        address.city = input.city.clone();
        address.region = input.region.clone();
        address.postal_code = input.postal_code.clone();
        address.country = input.country.clone();
        Ok(address.clone())
    }

    async fn delete(&self, id: &AddressId) -> Result<(), DomainError> {
        self.addresses.write().unwrap().retain(|a| a.id != *id);
        Ok(())
    }

    async fn set_default(&self, user_id: &UserId, id: &AddressId) -> Result<(), DomainError> {
        let mut addresses = self.addresses.write().unwrap();
        for address in addresses.iter_mut().filter(|a| a.user_id == *user_id) {
            address.is_default = address.id == *id;
        }
        Ok(())
    }
}

// ============================================================================
// In-Memory Product Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
    last_query: Arc<RwLock<Option<ProductQuery>>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a product as-is and hand it back
    pub fn insert(&self, product: Product) -> Product {
        self.products
            .write()
            .unwrap()
            .insert(product.id, product.clone());
        product
    }

    /// The most recent query passed to `search`
    pub fn last_query(&self) -> Option<ProductQuery> {
        self.last_query.read().unwrap().clone()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, DomainError> {
        Ok(self.products.read().unwrap().get(id).cloned())
    }

    async fn search(&self, query: &ProductQuery) -> Result<Vec<Product>, DomainError> {
        *self.last_query.write().unwrap() = Some(query.clone());

        let products = self.products.read().unwrap();
        let mut matched: Vec<Product> = products
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        match query.sort {
            ProductSort::Newest => matched.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            ProductSort::PriceAsc => matched.sort_by_key(|p| p.price_cents),
            ProductSort::PriceDesc => matched.sort_by(|a, b| b.price_cents.cmp(&a.price_cents)),
        }
        Ok(page(matched.into_iter(), query.limit, query.offset))
    }

    async fn create(&self, new: &NewProduct) -> Result<Product, DomainError> {
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(),
            seller_id: new.seller_id,
            title: new.title.clone(),
            description: new.description.clone(),
            category: new.category.clone(),
            unit: new.unit,
            price_cents: new.price_cents,
            quantity_available: new.quantity_available,
            location: new.location.clone(),
            organic: new.organic,
            harvest_date: new.harvest_date,
            image_keys: new.image_keys.clone(),
            status: new.status,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };
        Ok(self.insert(product))
    }

    async fn update(
        &self,
        id: &ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, DomainError> {
        let mut products = self.products.write().unwrap();
        let product = products
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Product {} not found", id)))?;

        if let Some(title) = &update.title {
            product.title = title.clone();
        }
        if let Some(description) = &update.description {
            product.description = Some(description.clone());
        }
        if let Some(category) = &update.category {
            product.category = category.clone();
        }
        if let Some(unit) = update.unit {
            product.unit = unit;
        }
        if let Some(price) = update.price_cents {
            product.price_cents = price;
        }
        if let Some(quantity) = update.quantity_available {
            product.quantity_available = quantity;
        }
        if let Some(location) = &update.location {
            product.location = Some(location.clone());
        }
        if let Some(organic) = update.organic {
            product.organic = organic;
        }
        if let Some(date) = update.harvest_date {
            product.harvest_date = Some(date);
        }
        if let Some(keys) = &update.image_keys {
            product.image_keys = keys.clone();
        }
        if let Some(status) = update.status {
            product.status = status;
        }
        if let Some(reason) = &update.rejection_reason {
            product.rejection_reason = reason.clone();
        }
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn delete(&self, id: &ProductId) -> Result<(), DomainError> {
        self.products.write().unwrap().remove(id);
        Ok(())
    }

    async fn count_by_status(&self) -> Result<Vec<(ProductStatus, u64)>, DomainError> {
        let products = self.products.read().unwrap();
        Ok(ProductStatus::ALL
            .iter()
            .map(|s| (*s, products.values().filter(|p| p.status == *s).count() as u64))
            .filter(|(_, count)| *count > 0)
            .collect())
    }
}

// ============================================================================
// In-Memory Offer Repository
// ============================================================================

/// Shares the product map with an `InMemoryProductRepository` so that
/// `accept` can reserve stock like the SQL transaction does
pub struct InMemoryOfferRepository {
    offers: Arc<RwLock<HashMap<OfferId, Offer>>>,
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
}

impl InMemoryOfferRepository {
    pub fn new(products: &InMemoryProductRepository) -> Self {
        Self {
            offers: Arc::default(),
            products: products.products.clone(),
        }
    }

    /// Store an offer as-is and hand it back
    pub fn insert(&self, offer: Offer) -> Offer {
        self.offers.write().unwrap().insert(offer.id, offer.clone());
        offer
    }
}

#[async_trait]
impl OfferRepository for InMemoryOfferRepository {
    async fn find_by_id(&self, id: &OfferId) -> Result<Option<Offer>, DomainError> {
        Ok(self.offers.read().unwrap().get(id).cloned())
    }

    async fn list(&self, filter: &OfferFilter) -> Result<Vec<Offer>, DomainError> {
        let offers = self.offers.read().unwrap();
        let mut matched: Vec<Offer> = offers
            .values()
            .filter(|o| match (filter.buyer_id, filter.seller_id) {
                (Some(b), Some(s)) => o.buyer_id == b || o.seller_id == s,
                (Some(b), None) => o.buyer_id == b,
                (None, Some(s)) => o.seller_id == s,
                (None, None) => true,
            })
            .filter(|o| filter.product_id.map_or(true, |p| o.product_id == p))
            .filter(|o| filter.status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(page(matched.into_iter(), filter.limit, filter.offset))
    }

    async fn create(&self, new: &NewOffer) -> Result<Offer, DomainError> {
        let now = Utc::now();
        Ok(self.insert(Offer {
            id: OfferId::new(),
            product_id: new.product_id,
            buyer_id: new.buyer_id,
            seller_id: new.seller_id,
            quantity: new.quantity,
            price_cents: new.price_cents,
            counter_price_cents: None,
            message: new.message.clone(),
            status: OfferStatus::Pending,
            created_at: now,
            updated_at: now,
        }))
    }

    async fn update_status(
        &self,
        id: &OfferId,
        from: OfferStatus,
        status: OfferStatus,
        counter_price_cents: Option<i64>,
    ) -> Result<Offer, DomainError> {
        let mut offers = self.offers.write().unwrap();
        let offer = offers
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Offer {} not found", id)))?;
        if offer.status != from {
            return Err(DomainError::Conflict(format!("Offer is already {}", offer.status)));
        }
        offer.status = status;
        if counter_price_cents.is_some() {
            offer.counter_price_cents = counter_price_cents;
        }
        offer.updated_at = Utc::now();
        Ok(offer.clone())
    }

    async fn accept(&self, id: &OfferId, from: OfferStatus) -> Result<Offer, DomainError> {
        let mut offers = self.offers.write().unwrap();
        let mut products = self.products.write().unwrap();

        let offer = offers
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Offer {} not found", id)))?;
        if offer.status != from || !offer.status.is_open() {
            return Err(DomainError::Conflict(format!("Offer is already {}", offer.status)));
        }
        let product = products
            .get_mut(&offer.product_id)
            .filter(|p| p.status == ProductStatus::Active)
            .ok_or_else(|| DomainError::Conflict("Listing is no longer available".to_string()))?;
        if product.quantity_available < offer.quantity {
            return Err(DomainError::Conflict(
                "Not enough stock left to accept this offer".to_string(),
            ));
        }

        let now = Utc::now();
        product.quantity_available -= offer.quantity;
        if product.quantity_available <= 0.0 {
            product.quantity_available = 0.0;
            product.status = ProductStatus::SoldOut;
        }
        product.updated_at = now;

        offer.status = OfferStatus::Accepted;
        offer.updated_at = now;
        Ok(offer.clone())
    }

    async fn count_for_product(&self, product_id: &ProductId) -> Result<u64, DomainError> {
        let offers = self.offers.read().unwrap();
        Ok(offers.values().filter(|o| o.product_id == *product_id).count() as u64)
    }

    async fn count_by_status(&self) -> Result<Vec<(OfferStatus, u64)>, DomainError> {
        let offers = self.offers.read().unwrap();
        Ok(OfferStatus::ALL
            .iter()
            .map(|s| (*s, offers.values().filter(|o| o.status == *s).count() as u64))
            .filter(|(_, count)| *count > 0)
            .collect())
    }
}

// ============================================================================
// In-Memory Chat Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryChatRepository {
    conversations: Arc<RwLock<Vec<Conversation>>>,
    messages: Arc<RwLock<Vec<Message>>>,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn find_conversation(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, DomainError> {
        let conversations = self.conversations.read().unwrap();
        Ok(conversations.iter().find(|c| c.id == *id).cloned())
    }

    async fn find_conversation_between(
        &self,
        new: &NewConversation,
    ) -> Result<Option<Conversation>, DomainError> {
        let conversations = self.conversations.read().unwrap();
        Ok(conversations
            .iter()
            .find(|c| {
                c.buyer_id == new.buyer_id
                    && c.seller_id == new.seller_id
                    && c.product_id == new.product_id
            })
            .cloned())
    }

    async fn create_conversation(
        &self,
        new: &NewConversation,
    ) -> Result<Conversation, DomainError> {
        let conversation = Conversation {
            id: ConversationId(Uuid::new_v4()),
            buyer_id: new.buyer_id,
            seller_id: new.seller_id,
            product_id: new.product_id,
            last_message_at: None,
            created_at: Utc::now(),
        };
        self.conversations
            .write()
            .unwrap()
            .push(conversation.clone());
        Ok(conversation)
    }

    async fn list_conversations(
        &self,
        user_id: &UserId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Conversation>, DomainError> {
        let conversations = self.conversations.read().unwrap();
        let mut mine: Vec<Conversation> = conversations
            .iter()
            .filter(|c| c.is_participant(user_id))
            .cloned()
            .collect();
        // Most recent activity first, silent threads last
        mine.sort_by(|a, b| {
            b.last_message_at
                .cmp(&a.last_message_at)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(page(mine.into_iter(), limit, offset))
    }

    async fn list_messages(
        &self,
        conversation_id: &ConversationId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Message>, DomainError> {
        let messages = self.messages.read().unwrap();
        Ok(page(
            messages
                .iter()
                .filter(|m| m.conversation_id == *conversation_id)
                .cloned(),
            limit,
            offset,
        ))
    }

    async fn create_message(&self, new: &NewMessage) -> Result<Message, DomainError> {
        let mut conversations = self.conversations.write().unwrap();
        let conversation = conversations
            .iter_mut()
            .find(|c| c.id == new.conversation_id)
            .ok_or_else(|| {
                DomainError::NotFound(format!("Conversation {} not found", new.conversation_id))
            })?;

        let message = Message {
            id: MessageId(Uuid::new_v4()),
            conversation_id: new.conversation_id,
            sender_id: new.sender_id,
            body: new.body.clone(),
            attachment_key: new.attachment_key.clone(),
            read_at: None,
            created_at: Utc::now(),
        };
        conversation.last_message_at = Some(message.created_at);
        self.messages.write().unwrap().push(message.clone());
        Ok(message)
    }

    async fn mark_read(
        &self,
        conversation_id: &ConversationId,
        reader: &UserId,
    ) -> Result<u64, DomainError> {
        let mut messages = self.messages.write().unwrap();
        let now = Utc::now();
        let mut changed = 0;
        for message in messages.iter_mut().filter(|m| {
            m.conversation_id == *conversation_id && m.sender_id != *reader && m.read_at.is_none()
        }) {
            message.read_at = Some(now);
            changed += 1;
        }
        Ok(changed)
    }

    async fn unread_count(&self, user_id: &UserId) -> Result<u64, DomainError> {
        let conversations = self.conversations.read().unwrap();
        let messages = self.messages.read().unwrap();
        let mine: Vec<ConversationId> = conversations
            .iter()
            .filter(|c| c.is_participant(user_id))
            .map(|c| c.id)
            .collect();
        Ok(messages
            .iter()
            .filter(|m| {
                mine.contains(&m.conversation_id) && m.sender_id != *user_id && m.read_at.is_none()
            })
            .count() as u64)
    }
}

// ============================================================================
// In-Memory Review Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryReviewRepository {
    reviews: Arc<RwLock<Vec<Review>>>,
}

impl InMemoryReviewRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReviewRepository for InMemoryReviewRepository {
    async fn find_by_id(&self, id: &ReviewId) -> Result<Option<Review>, DomainError> {
        let reviews = self.reviews.read().unwrap();
        Ok(reviews.iter().find(|r| r.id == *id).cloned())
    }

    async fn find_by_offer_and_reviewer(
        &self,
        offer_id: &OfferId,
        reviewer_id: &UserId,
    ) -> Result<Option<Review>, DomainError> {
        let reviews = self.reviews.read().unwrap();
        Ok(reviews
            .iter()
            .find(|r| r.offer_id == *offer_id && r.reviewer_id == *reviewer_id)
            .cloned())
    }

    async fn list_for_user(
        &self,
        reviewee_id: &UserId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Review>, DomainError> {
        let reviews = self.reviews.read().unwrap();
        Ok(page(
            reviews
                .iter()
                .rev()
                .filter(|r| r.reviewee_id == *reviewee_id)
                .cloned(),
            limit,
            offset,
        ))
    }

    async fn ratings_for_user(&self, reviewee_id: &UserId) -> Result<Vec<i16>, DomainError> {
        let reviews = self.reviews.read().unwrap();
        Ok(reviews
            .iter()
            .filter(|r| r.reviewee_id == *reviewee_id)
            .map(|r| r.rating)
            .collect())
    }

    async fn create(&self, new: &NewReview) -> Result<Review, DomainError> {
        let mut reviews = self.reviews.write().unwrap();
        if reviews
            .iter()
            .any(|r| r.offer_id == new.offer_id && r.reviewer_id == new.reviewer_id)
        {
            return Err(DomainError::AlreadyExists(
                "Review for this offer already exists".to_string(),
            ));
        }

        let review = Review {
            id: ReviewId(Uuid::new_v4()),
            offer_id: new.offer_id,
            reviewer_id: new.reviewer_id,
            reviewee_id: new.reviewee_id,
            rating: new.rating,
            comment: new.comment.clone(),
            created_at: Utc::now(),
        };
        reviews.push(review.clone());
        Ok(review)
    }

    async fn delete(&self, id: &ReviewId) -> Result<(), DomainError> {
        self.reviews.write().unwrap().retain(|r| r.id != *id);
        Ok(())
    }
}

// ============================================================================
// In-Memory Verification Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryVerificationRepository {
    requests: Arc<RwLock<Vec<VerificationRequest>>>,
}

impl InMemoryVerificationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VerificationRepository for InMemoryVerificationRepository {
    async fn find_by_id(
        &self,
        id: &VerificationId,
    ) -> Result<Option<VerificationRequest>, DomainError> {
        let requests = self.requests.read().unwrap();
        Ok(requests.iter().find(|r| r.id == *id).cloned())
    }

    async fn find_pending_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<VerificationRequest>, DomainError> {
        let requests = self.requests.read().unwrap();
        Ok(requests
            .iter()
            .find(|r| r.user_id == *user_id && r.status == VerificationStatus::Pending)
            .cloned())
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<VerificationRequest>, DomainError> {
        let requests = self.requests.read().unwrap();
        Ok(requests
            .iter()
            .rev()
            .filter(|r| r.user_id == *user_id)
            .cloned()
            .collect())
    }

    async fn list(
        &self,
        status: Option<VerificationStatus>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<VerificationRequest>, DomainError> {
        let requests = self.requests.read().unwrap();
        Ok(page(
            requests
                .iter()
                .filter(|r| status.map_or(true, |s| r.status == s))
                .cloned(),
            limit,
            offset,
        ))
    }

    async fn create(
        &self,
        new: &NewVerificationRequest,
    ) -> Result<VerificationRequest, DomainError> {
        let request = VerificationRequest {
            id: VerificationId(Uuid::new_v4()),
            user_id: new.user_id,
            document_type: new.document_type,
            document_keys: new.document_keys.clone(),
            notes: new.notes.clone(),
            status: VerificationStatus::Pending,
            reviewer_id: None,
            review_notes: None,
            submitted_at: Utc::now(),
            reviewed_at: None,
        };
        self.requests.write().unwrap().push(request.clone());
        Ok(request)
    }

    async fn decide(
        &self,
        id: &VerificationId,
        decision: &VerificationDecision,
    ) -> Result<VerificationRequest, DomainError> {
        let mut requests = self.requests.write().unwrap();
        let request = requests
            .iter_mut()
            .find(|r| r.id == *id)
            .ok_or_else(|| DomainError::NotFound(format!("Verification request {} not found", id)))?;
        if request.status != VerificationStatus::Pending {
            return Err(DomainError::Conflict(format!(
                "Verification request is already {}",
                request.status
            )));
        }
        request.status = decision.status;
        request.reviewer_id = Some(decision.reviewer_id);
        request.review_notes = decision.review_notes.clone();
        request.reviewed_at = Some(Utc::now());
        Ok(request.clone())
    }

    async fn count_pending(&self) -> Result<u64, DomainError> {
        let requests = self.requests.read().unwrap();
        Ok(requests
            .iter()
            .filter(|r| r.status == VerificationStatus::Pending)
            .count() as u64)
    }
}

// ============================================================================
// In-Memory Notification + Preference Repositories
// ============================================================================

#[derive(Default)]
pub struct InMemoryNotificationRepository {
    notifications: Arc<RwLock<Vec<Notification>>>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored notification, oldest first
    pub fn all(&self) -> Vec<Notification> {
        self.notifications.read().unwrap().clone()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn create(&self, new: &NewNotification) -> Result<Notification, DomainError> {
        let notification = Notification {
            id: NotificationId(Uuid::new_v4()),
            user_id: new.user_id,
            kind: new.kind,
            urgency: new.urgency,
            channel: new.channel,
            title: new.title.clone(),
            body: new.body.clone(),
            data: new.data.clone(),
            estimated_cost: new.estimated_cost,
            downgraded: new.downgraded,
            read_at: None,
            created_at: Utc::now(),
        };
        self.notifications
            .write()
            .unwrap()
            .push(notification.clone());
        Ok(notification)
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        unread_only: bool,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Notification>, DomainError> {
        let notifications = self.notifications.read().unwrap();
        Ok(page(
            notifications
                .iter()
                .rev()
                .filter(|n| n.user_id == *user_id && (!unread_only || n.read_at.is_none()))
                .cloned(),
            limit,
            offset,
        ))
    }

    async fn unread_count(&self, user_id: &UserId) -> Result<u64, DomainError> {
        let notifications = self.notifications.read().unwrap();
        Ok(notifications
            .iter()
            .filter(|n| n.user_id == *user_id && n.read_at.is_none())
            .count() as u64)
    }

    async fn mark_read(
        &self,
        id: &NotificationId,
        user_id: &UserId,
    ) -> Result<bool, DomainError> {
        let mut notifications = self.notifications.write().unwrap();
        match notifications
            .iter_mut()
            .find(|n| n.id == *id && n.user_id == *user_id)
        {
            Some(n) => {
                n.read_at.get_or_insert_with(Utc::now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, DomainError> {
        let mut notifications = self.notifications.write().unwrap();
        let now = Utc::now();
        let mut changed = 0;
        for n in notifications
            .iter_mut()
            .filter(|n| n.user_id == *user_id && n.read_at.is_none())
        {
            n.read_at = Some(now);
            changed += 1;
        }
        Ok(changed)
    }

    async fn cost_summary(&self, since: DateTime<Utc>) -> Result<Vec<ChannelCost>, DomainError> {
        let notifications = self.notifications.read().unwrap();
        let mut totals: BTreeMap<Channel, ChannelCost> = BTreeMap::new();
        for n in notifications.iter().filter(|n| n.created_at >= since) {
            let entry = totals.entry(n.channel).or_insert(ChannelCost {
                channel: n.channel,
                sent: 0,
                total_cost: 0.0,
            });
            entry.sent += 1;
            entry.total_cost += n.estimated_cost;
        }
        Ok(totals.into_values().collect())
    }
}

#[derive(Default)]
pub struct InMemoryPreferenceRepository {
    preferences: Arc<RwLock<HashMap<UserId, NotificationPreferences>>>,
}

impl InMemoryPreferenceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceRepository for InMemoryPreferenceRepository {
    async fn get(&self, user_id: &UserId) -> Result<Option<NotificationPreferences>, DomainError> {
        Ok(self.preferences.read().unwrap().get(user_id).cloned())
    }

    async fn upsert(
        &self,
        user_id: &UserId,
        preferences: &NotificationPreferences,
    ) -> Result<(), DomainError> {
        self.preferences
            .write()
            .unwrap()
            .insert(*user_id, preferences.clone());
        Ok(())
    }
}

// ============================================================================
// Delivery provider mocks
// ============================================================================

fn unavailable(provider: &'static str) -> DeliveryError {
    DeliveryError::Rejected {
        provider,
        status: 503,
        message: "service unavailable".to_string(),
    }
}

/// Records (phone, message) pairs; `failing()` rejects every send
#[derive(Clone, Default)]
pub struct MockSmsGateway {
    sent: Arc<RwLock<Vec<(String, String)>>>,
    attempts: Arc<AtomicUsize>,
    fail: bool,
}

impl MockSmsGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.read().unwrap().clone()
    }

    /// Sends tried, including rejected ones
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SmsGateway for MockSmsGateway {
    fn provider(&self) -> &'static str {
        "mock_sms"
    }

    async fn send_sms(&self, phone: &str, message: &str) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(unavailable(self.provider()));
        }
        self.sent
            .write()
            .unwrap()
            .push((phone.to_string(), message.to_string()));
        Ok(())
    }
}

/// Records (to, subject, body)
#[derive(Clone, Default)]
pub struct MockEmailSender {
    sent: Arc<RwLock<Vec<(String, String, String)>>>,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.read().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for MockEmailSender {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError> {
        self.sent
            .write()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

/// Records (device token, title, body)
#[derive(Clone, Default)]
pub struct MockPushSender {
    sent: Arc<RwLock<Vec<(String, String, String)>>>,
}

impl MockPushSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.read().unwrap().clone()
    }
}

#[async_trait]
impl PushSender for MockPushSender {
    async fn send_push(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
        _data: &serde_json::Value,
    ) -> Result<(), DeliveryError> {
        self.sent.write().unwrap().push((
            device_token.to_string(),
            title.to_string(),
            body.to_string(),
        ));
        Ok(())
    }
}

// ============================================================================
// Object store mock
// ============================================================================

#[derive(Clone, Default)]
pub struct MockObjectStore {
    objects: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
    fail: bool,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Pretend an object was uploaded earlier
    pub fn insert(&self, key: &str) {
        self.objects
            .write()
            .unwrap()
            .insert(key.to_string(), Vec::new());
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.read().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn put_object(
        &self,
        key: &str,
        _content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::Api {
                status: 500,
                message: "bucket unavailable".to_string(),
            });
        }
        self.objects.write().unwrap().insert(key.to_string(), bytes);
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::Api {
                status: 500,
                message: "bucket unavailable".to_string(),
            });
        }
        self.objects.write().unwrap().remove(key);
        Ok(())
    }
}

// ============================================================================
// Recording notifier
// ============================================================================

/// Captures notifications instead of delivering them
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Arc<RwLock<Vec<(UserId, OutgoingNotification)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(UserId, OutgoingNotification)> {
        self.sent.read().unwrap().clone()
    }
}

#[async_trait]
impl Notify for RecordingNotifier {
    async fn notify(
        &self,
        user_id: &UserId,
        notification: OutgoingNotification,
    ) -> Result<Notification, DomainError> {
        self.sent
            .write()
            .unwrap()
            .push((*user_id, notification.clone()));
        Ok(Notification {
            id: NotificationId(Uuid::new_v4()),
            user_id: *user_id,
            kind: notification.kind,
            urgency: notification.urgency,
            channel: Channel::InApp,
            title: notification.title,
            body: notification.body,
            data: notification.data,
            estimated_cost: 0.0,
            downgraded: false,
            read_at: None,
            created_at: Utc::now(),
        })
    }
}
