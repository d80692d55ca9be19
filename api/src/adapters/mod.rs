//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod delivery;
pub mod postgres;
pub mod storage;

pub use delivery::{
    CloudSmsGateway, FallbackSmsGateway, HttpEmailSender, HttpPushSender, HttpSmsGateway,
};
pub use postgres::{
    PostgresAddressRepository, PostgresChatRepository, PostgresNotificationRepository,
    PostgresOfferRepository, PostgresPreferenceRepository, PostgresProductRepository,
    PostgresReviewRepository, PostgresUserRepository, PostgresVerificationRepository,
};
pub use storage::HttpObjectStore;
