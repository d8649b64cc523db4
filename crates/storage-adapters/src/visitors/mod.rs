//! Backends for the visitor counter widget.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use memory::InMemoryVisitorCounter;
#[cfg(feature = "redis")]
pub use redis::RedisVisitorCounter;
