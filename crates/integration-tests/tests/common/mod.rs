//! Fixtures shared by the HTTP-level tests: a router wired with mock ports
//! and helpers to build tokens and send requests.

#![allow(dead_code)]

use std::sync::Arc;

use api_adapters::{router, AppState, PortalOptions, Ports};
use auth_adapters::PayloadDecoder;
use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use domains::{
    AppItem, GameRequest, MockAdminCatalogApi, MockCatalogApi, MockRequestApi, MockUserApi,
    VisitorId,
};
use serde_json::{json, Value};
use storage_adapters::InMemoryVisitorCounter;
use tower::ServiceExt;

pub struct Harness {
    pub requests: MockRequestApi,
    pub catalog: MockCatalogApi,
    pub admin: MockAdminCatalogApi,
    pub users: MockUserApi,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            requests: MockRequestApi::new(),
            catalog: MockCatalogApi::new(),
            admin: MockAdminCatalogApi::new(),
            users: MockUserApi::new(),
        }
    }

    pub fn router(self) -> Router {
        self.router_with_state().0
    }

    /// Router plus the state behind it, for tests that inspect the state.
    pub fn router_with_state(self) -> (Router, Arc<AppState>) {
        let ports = Ports {
            requests: Arc::new(self.requests),
            catalog: Arc::new(self.catalog),
            admin: Arc::new(self.admin),
            users: Arc::new(self.users),
            decoder: Arc::new(PayloadDecoder),
            visitors: Arc::new(InMemoryVisitorCounter::new()),
        };
        let state = Arc::new(AppState::new(ports, PortalOptions::default()));
        (router(Arc::clone(&state)), state)
    }
}

/// Unsigned JWT-shaped token carrying `claims`.
pub fn token(claims: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2ln")
}

pub fn user_token(id: &str) -> String {
    token(json!({ "id": id, "role": "USER" }))
}

pub fn admin_token() -> String {
    token(json!({ "id": "admin-1", "role": "ADMIN" }))
}

pub fn visitor_cookie(visitor: &VisitorId) -> String {
    format!("userId={visitor}")
}

pub fn game_request(id: &str, status: &str, votes: u32) -> GameRequest {
    serde_json::from_value(json!({
        "_id": id,
        "title": format!("Game {id}"),
        "platform": "PC",
        "status": status,
        "votes": votes,
        "createdAt": "2025-03-01T10:00:00Z"
    }))
    .unwrap()
}

pub fn app_item(id: &str, paid: bool) -> AppItem {
    let price = paid.then_some(9.99);
    serde_json::from_value(json!({
        "_id": id,
        "title": format!("Title {id}"),
        "isPaid": paid,
        "price": price,
        "category": "pc"
    }))
    .unwrap()
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> Reply {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    Reply {
        status,
        headers,
        body: body.to_vec(),
    }
}

/// Request builder with optional bearer token and visitor cookie.
pub fn request(
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    visitor: Option<&VisitorId>,
    json_body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(visitor) = visitor {
        builder = builder.header(header::COOKIE, visitor_cookie(visitor));
    }
    match json_body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
