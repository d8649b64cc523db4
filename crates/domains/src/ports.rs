//! # Ports
//!
//! Contracts the services depend on. Adapters in `storage-adapters` and
//! `auth-adapters` implement them; tests use the `mockall` doubles exposed
//! through the `testing` feature.

use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::SecretString;

use crate::errors::Result;
use crate::models::{
    AppDraft, AppItem, Attachment, CatalogPage, CatalogQuery, Claims, GameRequest, NewRequest,
    QuotaStatus, SubmitReceipt, VisitorId, VisitorStats,
};

/// Community request endpoints of the remote API.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RequestApi: Send + Sync {
    /// Every request, all statuses, in server order.
    async fn list_requests(&self) -> Result<Vec<GameRequest>>;

    /// Read-only weekly quota check for the token's user.
    async fn quota(&self, token: &SecretString) -> Result<QuotaStatus>;

    async fn submit_request(&self, token: &SecretString, request: &NewRequest)
        -> Result<SubmitReceipt>;

    async fn vote(&self, token: &SecretString, request_id: &str) -> Result<()>;
}

/// Public catalog endpoints.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn category_page(&self, slug: &str, query: &CatalogQuery) -> Result<CatalogPage>;

    async fn search(&self, term: &str, limit: u32) -> Result<Vec<AppItem>>;
}

/// Admin CRUD endpoints. The remote API checks the admin role itself.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AdminCatalogApi: Send + Sync {
    async fn create_app(
        &self,
        token: &SecretString,
        draft: &AppDraft,
        attachments: Vec<Attachment>,
    ) -> Result<AppItem>;

    async fn edit_app(&self, token: &SecretString, id: &str, draft: &AppDraft) -> Result<AppItem>;

    async fn get_app(&self, token: &SecretString, id: &str) -> Result<AppItem>;
}

/// Identity lookup used when a token cannot be decoded locally.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserApi: Send + Sync {
    async fn me(&self, token: &SecretString) -> Result<Claims>;
}

/// Reads claims out of a bearer token without verifying it.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenDecoder: Send + Sync {
    fn decode(&self, token: &str) -> Result<Claims>;
}

/// Realtime key-value store behind the visitor counter widget.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait VisitorCounterStore: Send + Sync {
    /// Counts `visitor` once overall and once for `day`, returning the
    /// updated totals.
    async fn record_visit(&self, visitor: &VisitorId, day: NaiveDate) -> Result<VisitorStats>;

    async fn stats(&self, day: NaiveDate) -> Result<VisitorStats>;
}
