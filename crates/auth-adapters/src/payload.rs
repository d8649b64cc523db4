use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use domains::{Claims, DomainError, Result, TokenDecoder};
use tracing::trace;

/// Reads the middle segment of a `header.payload.signature` token.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadDecoder;

impl TokenDecoder for PayloadDecoder {
    fn decode(&self, token: &str) -> Result<Claims> {
        let segments: Vec<&str> = token.trim().split('.').collect();
        let payload = match segments.as_slice() {
            [_, payload, _] => *payload,
            _ => return Err(DomainError::Decode("token is not a three-part JWT".into())),
        };

        // some issuers pad, base64url-no-pad does not accept it
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| DomainError::Decode(format!("payload is not base64url: {e}")))?;

        let claims: Claims = serde_json::from_slice(&bytes)
            .map_err(|e| DomainError::Decode(format!("payload is not a claims object: {e}")))?;
        trace!(user_id = claims.id.as_deref().unwrap_or("-"), "token payload decoded");
        Ok(claims)
    }
}
