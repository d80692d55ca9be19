//! PostgreSQL adapters
//!
//! Implementations of repository traits using SeaORM and PostgreSQL.

pub mod address_repo;
pub mod chat_repo;
pub mod notification_repo;
pub mod offer_repo;
pub mod product_repo;
pub mod review_repo;
pub mod user_repo;
pub mod verification_repo;


pub use address_repo::PostgresAddressRepository;
pub use chat_repo::PostgresChatRepository;
pub use notification_repo::{PostgresNotificationRepository, PostgresPreferenceRepository};
pub use offer_repo::PostgresOfferRepository;
pub use product_repo::PostgresProductRepository;
pub use review_repo::PostgresReviewRepository;
pub use user_repo::PostgresUserRepository;
pub use verification_repo::PostgresVerificationRepository;
