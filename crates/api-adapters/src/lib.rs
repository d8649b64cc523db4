//! game-vault/crates/api-adapters/src/lib.rs
//!
//! Inbound adapters: HTML pages rendered with askama, the JSON endpoints the
//! page widgets call, and the Prometheus registry. The axum surface lives
//! behind the `web-axum` feature.

pub mod metrics;
pub mod templates;

#[cfg(feature = "web-axum")]
pub mod web;

pub use metrics::PortalMetrics;
#[cfg(feature = "web-axum")]
pub use web::{router, AppState, BoardStore, PortalOptions, Ports};
