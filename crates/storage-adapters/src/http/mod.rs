//! # Remote API client
//!
//! `reqwest` implementation of every API port. Each call carries the static
//! service header (`X-Auth-Token`) and, where the endpoint needs a user, the
//! caller's bearer token. Non-2xx answers are classified per operation in
//! [`errors::classify`].

mod endpoints;
pub mod errors;

use std::time::Duration;

use domains::{DomainError, Result};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use errors::{classify, transport, ErrorBody};

pub const SERVICE_TOKEN_HEADER: &str = "X-Auth-Token";

/// Upstream operations, used to pick the error mapping and for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListRequests,
    Quota,
    SubmitRequest,
    Vote,
    Me,
    CategoryPage,
    Search,
    CreateApp,
    EditApp,
    GetApp,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListRequests => "list_requests",
            Self::Quota => "quota",
            Self::SubmitRequest => "submit_request",
            Self::Vote => "vote",
            Self::Me => "me",
            Self::CategoryPage => "category_page",
            Self::Search => "search",
            Self::CreateApp => "create_app",
            Self::EditApp => "edit_app",
            Self::GetApp => "get_app",
        }
    }

    /// What a 404 means for this operation.
    pub fn resource(&self) -> &'static str {
        match self {
            Self::ListRequests | Self::SubmitRequest | Self::Vote => "request",
            Self::Quota => "quota endpoint",
            Self::Me => "user",
            Self::CategoryPage => "category",
            Self::Search => "search endpoint",
            Self::CreateApp | Self::EditApp | Self::GetApp => "app",
        }
    }
}

pub struct RemoteApi {
    client: Client,
    base_url: Url,
    service_token: SecretString,
}

impl RemoteApi {
    /// Builds a client for `base_url` (e.g. `https://api.example.com`).
    pub fn new(base_url: &str, service_token: SecretString, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| DomainError::Validation(format!("invalid API base URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(DomainError::Validation(format!(
                "API base URL '{base_url}' cannot carry paths"
            )));
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .user_agent(concat!("game-vault/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(transport)?;

        Ok(Self {
            client,
            base_url,
            service_token,
        })
    }

    /// `base_url` + path segments, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DomainError::Validation("API base URL cannot carry paths".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
        bearer: Option<&SecretString>,
    ) -> Result<RequestBuilder> {
        let url = self.endpoint(segments)?;
        let mut builder = self
            .client
            .request(method, url)
            .header(SERVICE_TOKEN_HEADER, self.service_token.expose_secret());
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token.expose_secret());
        }
        Ok(builder)
    }

    /// Sends the request, returning the response only if it is 2xx.
    async fn execute(&self, operation: Operation, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await.map_err(|e| {
            warn!(operation = operation.as_str(), error = %e, "upstream unreachable");
            transport(e)
        })?;

        let status = response.status();
        if status.is_success() {
            debug!(operation = operation.as_str(), status = status.as_u16(), "upstream ok");
            return Ok(response);
        }

        let bytes = response.bytes().await.unwrap_or_default();
        let body = ErrorBody::parse(&bytes);
        let error = classify(operation, status, &body);
        debug!(
            operation = operation.as_str(),
            status = status.as_u16(),
            error = %error,
            "upstream rejected call"
        );
        Err(error)
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        operation: Operation,
        builder: RequestBuilder,
    ) -> Result<T> {
        let value: serde_json::Value = self
            .execute(operation, builder)
            .await?
            .json()
            .await
            .map_err(transport)?;
        serde_json::from_value(value).map_err(|e| {
            DomainError::Decode(format!("{} response: {e}", operation.as_str()))
        })
    }

    async fn execute_value(
        &self,
        operation: Operation,
        builder: RequestBuilder,
    ) -> Result<serde_json::Value> {
        self.execute_json(operation, builder).await
    }
}

/// Returns the wrapped document when the API nests it under one of `keys`
/// (`{ "request": {...} }`), else the value itself.
fn unwrap_document(value: serde_json::Value, keys: &[&str]) -> serde_json::Value {
    if let serde_json::Value::Object(ref map) = value {
        for key in keys {
            if let Some(inner) = map.get(*key) {
                if inner.is_object() || inner.is_array() {
                    return inner.clone();
                }
            }
        }
    }
    value
}
