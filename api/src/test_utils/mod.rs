//! Test utilities
//!
//! Manual in-memory repositories, recording providers, and fixtures for
//! service-level tests.
//!
//! Mocks are written by hand rather than generated: the ports take `&str`
//! and borrowed ids, and a hand-written store can enforce the same
//! constraints the database does (unique emails, stock checks on accept).
//!
//! Handlers are covered by request/response serde tests next to them; the
//! services behind them are exercised here and in `integration_tests`.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
