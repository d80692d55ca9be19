//! Authentication
//!
//! Password hashing, access tokens, and the request middleware that turns a
//! bearer token into a `User`.

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::JwtKeys;
pub use middleware::{admin_middleware, auth_middleware, bearer_token};
