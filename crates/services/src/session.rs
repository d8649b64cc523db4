//! Builds the per-request [`Session`] from an optional bearer token.

use std::sync::Arc;

use chrono::Utc;
use domains::{Session, SessionSource, TokenDecoder, UserApi};
use secrecy::SecretString;
use tracing::debug;

pub struct SessionResolver {
    decoder: Arc<dyn TokenDecoder>,
    users: Arc<dyn UserApi>,
}

impl SessionResolver {
    pub fn new(decoder: Arc<dyn TokenDecoder>, users: Arc<dyn UserApi>) -> Self {
        Self { decoder, users }
    }

    /// Local decode first, `/api/user/me` second, guest otherwise.
    ///
    /// Failures are never surfaced: a visitor with a broken token simply
    /// browses as a guest.
    pub async fn resolve(&self, token: Option<&str>) -> Session {
        let Some(raw) = token.map(str::trim).filter(|t| !t.is_empty()) else {
            return Session::guest();
        };
        let secret = SecretString::from(raw.to_string());

        match self.decoder.decode(raw) {
            Ok(claims) => {
                if claims.exp.is_some_and(|exp| exp < Utc::now().timestamp()) {
                    debug!("bearer token expired, continuing as guest");
                    return Session::guest();
                }
                Session::authenticated(secret, claims, SessionSource::Decoded)
            }
            Err(decode_err) => {
                debug!(error = %decode_err, "token not decodable locally, asking the API");
                match self.users.me(&secret).await {
                    Ok(claims) => Session::authenticated(secret, claims, SessionSource::Remote),
                    Err(e) => {
                        debug!(error = %e, "user lookup failed, continuing as guest");
                        Session::guest()
                    }
                }
            }
        }
    }
}
