//! # DomainError
//!
//! Centralized error handling for the portal. Every adapter translates its
//! own failures (HTTP status codes, decode failures, store errors) into one
//! of these variants so services can branch on meaning rather than on wire
//! details.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// The primary error type for all domain and port operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Client-side validation failure, detected before any network call.
    #[error("validation error: {0}")]
    Validation(String),

    /// Weekly submission quota used (HTTP 429 on request creation).
    #[error("request quota exceeded")]
    QuotaExceeded {
        next_available: Option<DateTime<Utc>>,
    },

    /// Daily vote already cast (HTTP 429 on vote).
    #[error("daily vote already used")]
    DailyVoteUsed,

    /// Account still inside the voting grace period (HTTP 403 on vote).
    #[error("account too new to vote, {days_left} day(s) left")]
    AccountTooNew { days_left: u32 },

    /// Missing or rejected credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found upstream.
    #[error("{0} not found")]
    NotFound(String),

    /// Any other non-2xx response from the remote API.
    #[error("upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// The remote API could not be reached or timed out.
    #[error("transport error: {0}")]
    Transport(String),

    /// A payload (token, response body, stored value) could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl DomainError {
    /// Server-provided message, when the failure carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Upstream { message, .. } if !message.trim().is_empty() => Some(message),
            Self::Unauthorized(message) if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }
}

/// A specialized Result type for portal logic.
pub type Result<T> = std::result::Result<T, DomainError>;
