//! SeaORM entity definitions
//!
//! One module per table. Hand-maintained to match `migrations/0001_init.sql`.

pub mod addresses;
pub mod conversations;
pub mod messages;
pub mod notification_preferences;
pub mod notifications;
pub mod offers;
pub mod products;
pub mod reviews;
pub mod users;
pub mod verification_requests;
