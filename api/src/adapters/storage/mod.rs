//! Object storage adapter

pub mod http_store;

pub use http_store::HttpObjectStore;
