//! Domain entities
//!
//! Pure domain models representing core business concepts.
//! These are separate from the SeaORM entities in the `entity` module.

pub mod address;
pub mod asset;
pub mod chat;
pub mod notification;
pub mod offer;
pub mod product;
pub mod review;
pub mod user;
pub mod verification;

pub use address::{Address, AddressId, AddressInput, NewAddress, MAX_ADDRESSES_PER_USER};
pub use asset::{validate_owned_keys, AssetPurpose};
pub use chat::{
    Conversation, ConversationId, Message, MessageId, NewConversation, NewMessage,
    MAX_MESSAGE_LEN,
};
pub use notification::{
    Channel, ChannelCost, ChannelPreference, NewNotification, Notification, NotificationId,
    NotificationKind, NotificationPreferences, OutgoingNotification, Urgency,
};
pub use offer::{NewOffer, Offer, OfferAction, OfferFilter, OfferId, OfferStatus, Party};
pub use product::{
    NewProduct, Product, ProductId, ProductQuery, ProductSort, ProductStatus, ProductUpdate, Unit,
    MAX_PRODUCT_IMAGES,
};
pub use review::{NewReview, RatingSummary, Review, ReviewId};
pub use user::{
    normalize_email, validate_phone, NewUser, PasswordReset, ProfileUpdate, Role, User, UserFilter,
    UserId,
};
pub use verification::{
    DocumentType, NewVerificationRequest, VerificationDecision, VerificationId,
    VerificationRequest, VerificationStatus, MAX_VERIFICATION_DOCUMENTS,
};
