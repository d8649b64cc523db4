//! game-vault/crates/storage-adapters/src/lib.rs
//!
//! Outbound adapters: the HTTP client for the remote catalog API and the
//! visitor counter backends.

pub mod http;
pub mod visitors;

pub use http::{Operation, RemoteApi, SERVICE_TOKEN_HEADER};
pub use visitors::InMemoryVisitorCounter;
#[cfg(feature = "redis")]
pub use visitors::RedisVisitorCounter;
