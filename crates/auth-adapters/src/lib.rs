//! # auth-adapters
//!
//! [`TokenDecoder`](domains::TokenDecoder) implementations. Both read the
//! claims of a bearer token *without* verifying its signature: the portal
//! only uses them to decide what to display.
//!
//! - [`PayloadDecoder`]: plain base64url decode of the JWT payload segment.
//!   Always available.
//! - [`JwtClaimsDecoder`] (feature `auth-jwt`): parses the full token with
//!   `jsonwebtoken`, which also rejects malformed headers.

mod payload;
pub use payload::PayloadDecoder;

#[cfg(feature = "auth-jwt")]
mod jwt;
#[cfg(feature = "auth-jwt")]
pub use jwt::JwtClaimsDecoder;

use std::sync::Arc;

use domains::TokenDecoder;

/// The decoder the enabled features call for.
pub fn default_decoder() -> Arc<dyn TokenDecoder> {
    #[cfg(feature = "auth-jwt")]
    {
        Arc::new(JwtClaimsDecoder::new())
    }
    #[cfg(not(feature = "auth-jwt"))]
    {
        Arc::new(PayloadDecoder)
    }
}
