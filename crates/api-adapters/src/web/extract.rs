//! Request extractors: the caller's session and their visitor id.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName};
use domains::{Session, VisitorId};

use super::state::AppState;

pub const TOKEN_COOKIE: &str = "token";
pub const VISITOR_COOKIE: &str = "userId";
const VISITOR_COOKIE_MAX_AGE: u64 = 60 * 60 * 24 * 365;

/// Value of cookie `name` from the `Cookie` headers.
pub fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// `Authorization: Bearer` first, then the `token` cookie.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            let (scheme, token) = value.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim().to_string())
        })
        .filter(|token| !token.is_empty());

    from_header.or_else(|| cookie(headers, TOKEN_COOKIE))
}

/// The resolved session for this request. Never rejects: anything that
/// cannot be resolved is a guest.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl FromRequestParts<Arc<AppState>> for CurrentSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers);
        Ok(Self(state.sessions.resolve(token.as_deref()).await))
    }
}

/// Visitor id from the `userId` cookie, minted when absent or malformed.
#[derive(Debug, Clone)]
pub struct Visitor {
    pub id: VisitorId,
    /// The id is new and must be sent back with [`Visitor::set_cookie`]
    pub issued: bool,
}

impl Visitor {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match cookie(headers, VISITOR_COOKIE).and_then(|raw| VisitorId::parse(&raw)) {
            Some(id) => Self { id, issued: false },
            None => Self {
                id: VisitorId::generate(),
                issued: true,
            },
        }
    }

    /// `Set-Cookie` header for a freshly issued id, nothing otherwise.
    pub fn set_cookie(&self) -> Option<(HeaderName, String)> {
        self.issued.then(|| {
            (
                SET_COOKIE,
                format!(
                    "{VISITOR_COOKIE}={}; Path=/; Max-Age={VISITOR_COOKIE_MAX_AGE}; SameSite=Lax",
                    self.id
                ),
            )
        })
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Visitor {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_bearer_header_wins_over_cookie() {
        let map = headers(&[
            (AUTHORIZATION, "Bearer abc.def.ghi"),
            (COOKIE, "token=cookie-token"),
        ]);
        assert_eq!(bearer_token(&map).as_deref(), Some("abc.def.ghi"));

        let map = headers(&[(COOKIE, "theme=dark; token=cookie-token")]);
        assert_eq!(bearer_token(&map).as_deref(), Some("cookie-token"));

        let map = headers(&[(AUTHORIZATION, "Basic Zm9vOmJhcg==")]);
        assert_eq!(bearer_token(&map), None);
    }

    #[test]
    fn test_visitor_cookie_reuse_and_issue() {
        let id = VisitorId::generate();
        let raw = format!("userId={id}");
        let map = headers(&[(COOKIE, raw.as_str())]);
        let visitor = Visitor::from_headers(&map);
        assert!(!visitor.issued);
        assert_eq!(visitor.id, id);
        assert!(visitor.set_cookie().is_none());

        let visitor = Visitor::from_headers(&headers(&[(COOKIE, "userId=not-a-uuid")]));
        assert!(visitor.issued);
        let (name, value) = visitor.set_cookie().unwrap();
        assert_eq!(name, SET_COOKIE);
        assert!(value.starts_with(&format!("userId={}", visitor.id)));
    }
}
