//! Session context derived from the caller's bearer token.
//!
//! Claims are read without signature verification. They drive what the
//! portal *shows* (locked cards, admin forms, vote buttons); every decision
//! that matters is enforced again by the remote API.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::{AppItem, EntityRef};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::User
        }
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        match value {
            Role::Admin => "ADMIN".to_string(),
            Role::User => "USER".to_string(),
        }
    }
}

/// Token payload (or `/api/user/me` body).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawClaims")]
pub struct Claims {
    pub id: Option<String>,
    pub role: Role,
    pub name: Option<String>,
    pub purchased_games: Vec<EntityRef>,
    pub created_at: Option<DateTime<Utc>>,
    pub exp: Option<i64>,
}

/// Wire shape of [`Claims`]. Issuers name the user id and the purchase list
/// differently and sometimes send several spellings at once.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClaims {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "_id")]
    mongo_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    role: Role,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    purchased_games: Option<Vec<EntityRef>>,
    #[serde(default)]
    g_data: Option<Vec<EntityRef>>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    exp: Option<i64>,
}

impl From<RawClaims> for Claims {
    fn from(raw: RawClaims) -> Self {
        Self {
            id: raw.id.or(raw.mongo_id).or(raw.user_id),
            role: raw.role,
            name: raw.name,
            purchased_games: raw.purchased_games.or(raw.g_data).unwrap_or_default(),
            created_at: raw.created_at,
            exp: raw.exp,
        }
    }
}

impl Claims {
    pub fn owns(&self, item_id: &str) -> bool {
        self.purchased_games.iter().any(|g| g.id() == item_id)
    }
}

/// Where the session's claims came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionSource {
    /// Token payload decoded locally
    Decoded,
    /// Resolved through `GET /api/user/me`
    Remote,
    Guest,
}

/// Per-request session context, built once by the web layer and passed
/// explicitly to every service call.
#[derive(Debug, Clone)]
pub struct Session {
    token: Option<SecretString>,
    claims: Option<Claims>,
    source: SessionSource,
}

impl Session {
    pub fn guest() -> Self {
        Self {
            token: None,
            claims: None,
            source: SessionSource::Guest,
        }
    }

    pub fn authenticated(token: SecretString, claims: Claims, source: SessionSource) -> Self {
        Self {
            token: Some(token),
            claims: Some(claims),
            source,
        }
    }

    pub fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    pub fn source(&self) -> SessionSource {
        self.source
    }

    pub fn is_guest(&self) -> bool {
        self.claims.is_none()
    }

    pub fn is_admin(&self) -> bool {
        self.claims.as_ref().is_some_and(|c| c.role == Role::Admin)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.claims.as_ref().and_then(|c| c.id.as_deref())
    }

    pub fn display_name(&self) -> Option<&str> {
        self.claims.as_ref().and_then(|c| c.name.as_deref())
    }

    /// Download gate: admins, free items, and purchased items are unlocked.
    pub fn can_unlock(&self, item: &AppItem) -> bool {
        if !item.is_paid || self.is_admin() {
            return true;
        }
        self.claims.as_ref().is_some_and(|c| c.owns(&item.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paid_item(id: &str) -> AppItem {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "title": "Paid Game",
            "isPaid": true
        }))
        .unwrap()
    }

    fn session_with(role: Role, purchased: &[&str]) -> Session {
        let claims = Claims {
            id: Some("u1".into()),
            role,
            purchased_games: purchased.iter().map(|id| EntityRef::Id(id.to_string())).collect(),
            ..Claims::default()
        };
        Session::authenticated(SecretString::from("t"), claims, SessionSource::Decoded)
    }

    #[test]
    fn test_claims_accept_several_id_spellings() {
        let both: Claims =
            serde_json::from_value(serde_json::json!({ "id": "u1", "_id": "u1", "userId": "u1" }))
                .unwrap();
        assert_eq!(both.id.as_deref(), Some("u1"));

        let mongo: Claims =
            serde_json::from_value(serde_json::json!({ "_id": "m1", "userId": "x" })).unwrap();
        assert_eq!(mongo.id.as_deref(), Some("m1"));

        let legacy: Claims = serde_json::from_value(serde_json::json!({
            "userId": "u9",
            "purchasedGames": ["g1"],
            "gData": ["g2"]
        }))
        .unwrap();
        assert_eq!(legacy.id.as_deref(), Some("u9"));
        assert!(legacy.owns("g1"));
        assert!(!legacy.owns("g2"));

        let only_g_data: Claims =
            serde_json::from_value(serde_json::json!({ "gData": [{ "_id": "g3" }] })).unwrap();
        assert!(only_g_data.owns("g3"));
        assert_eq!(only_g_data.id, None);
    }

    #[test]
    fn test_paid_unowned_item_is_locked_for_user() {
        let item = paid_item("g1");
        assert!(!session_with(Role::User, &["other"]).can_unlock(&item));
        assert!(!Session::guest().can_unlock(&item));
    }

    #[test]
    fn test_each_condition_unlocks() {
        let item = paid_item("g1");
        assert!(session_with(Role::Admin, &[]).can_unlock(&item));
        assert!(session_with(Role::User, &["g1"]).can_unlock(&item));

        let mut free = item.clone();
        free.is_paid = false;
        assert!(session_with(Role::User, &[]).can_unlock(&free));
        assert!(Session::guest().can_unlock(&free));
    }

    #[test]
    fn test_claims_accept_legacy_field_names() {
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "_id": "u9",
            "role": "admin",
            "gData": [{ "_id": "g1" }, "g2"]
        }))
        .unwrap();
        assert_eq!(claims.id.as_deref(), Some("u9"));
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.owns("g1") && claims.owns("g2"));
    }
}
