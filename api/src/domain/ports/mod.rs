//! Domain ports (traits)
//!
//! Port traits define interfaces that the domain layer requires.
//! Adapters provide concrete implementations of these traits.

pub mod delivery;
pub mod notify;
pub mod repositories;
pub mod storage;

pub use delivery::{EmailSender, PushSender, SmsGateway};
pub use notify::Notify;
pub use repositories::{
    AddressRepository, ChatRepository, NotificationRepository, OfferRepository,
    PreferenceRepository, ProductRepository, ReviewRepository, UserRepository,
    VerificationRepository,
};
pub use storage::ObjectStore;
