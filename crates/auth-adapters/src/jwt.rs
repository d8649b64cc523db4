use std::collections::HashSet;

use domains::{Claims, DomainError, Result, TokenDecoder};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use tracing::trace;

use crate::PayloadDecoder;

/// `jsonwebtoken` based decoder with signature checks switched off.
///
/// HMAC tokens go through `jsonwebtoken`. Asymmetric ones (RS*, ES*, PS*,
/// EdDSA) would need a key of the matching family even when nothing is
/// verified, so after the header check their payload is read by
/// [`PayloadDecoder`].
///
/// Expiry is left to the session resolver, which treats an expired token as
/// a guest instead of an error.
pub struct JwtClaimsDecoder {
    key: DecodingKey,
}

impl JwtClaimsDecoder {
    pub fn new() -> Self {
        Self {
            key: DecodingKey::from_secret(&[]),
        }
    }

    fn validation(alg: Algorithm) -> Validation {
        let mut validation = Validation::new(alg);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();
        validation
    }
}

impl Default for JwtClaimsDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenDecoder for JwtClaimsDecoder {
    fn decode(&self, token: &str) -> Result<Claims> {
        let token = token.trim();
        let header =
            decode_header(token).map_err(|e| DomainError::Decode(format!("bad JWT header: {e}")))?;

        if !matches!(header.alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            trace!(alg = ?header.alg, "asymmetric token, reading payload directly");
            return PayloadDecoder.decode(token);
        }

        let data = decode::<Claims>(token, &self.key, &Self::validation(header.alg))
            .map_err(|e| DomainError::Decode(format!("bad JWT payload: {e}")))?;
        trace!(alg = ?header.alg, "token decoded");
        Ok(data.claims)
    }
}
