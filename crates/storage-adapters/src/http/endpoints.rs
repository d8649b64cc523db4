use async_trait::async_trait;
use domains::{
    AdminCatalogApi, AppDraft, AppItem, Attachment, CatalogApi, CatalogPage, CatalogQuery, Claims,
    DomainError, GameRequest, NewRequest, QuotaStatus, RequestApi, Result, SubmitReceipt, UserApi,
};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use secrecy::SecretString;
use tracing::instrument;

use super::{unwrap_document, Operation, RemoteApi};

#[async_trait]
impl RequestApi for RemoteApi {
    #[instrument(skip(self))]
    async fn list_requests(&self) -> Result<Vec<GameRequest>> {
        let builder = self.request(Method::GET, &["api", "requests"], None)?;
        let value = self.execute_value(Operation::ListRequests, builder).await?;
        let list = unwrap_document(value, &["requests", "data"]);
        serde_json::from_value(list)
            .map_err(|e| DomainError::Decode(format!("request list: {e}")))
    }

    #[instrument(skip_all)]
    async fn quota(&self, token: &SecretString) -> Result<QuotaStatus> {
        let builder = self.request(Method::GET, &["api", "requests", "quota"], Some(token))?;
        self.execute_json(Operation::Quota, builder).await
    }

    #[instrument(skip(self, token, request), fields(platform = %request.platform))]
    async fn submit_request(
        &self,
        token: &SecretString,
        request: &NewRequest,
    ) -> Result<SubmitReceipt> {
        let builder = self
            .request(Method::POST, &["api", "requests"], Some(token))?
            .json(request);
        let response = self.execute(Operation::SubmitRequest, builder).await?;

        // the receipt is informational; an empty or odd body is still a success
        let value: serde_json::Value = response.json().await.unwrap_or_default();
        let document = unwrap_document(value, &["request", "data"]);
        Ok(serde_json::from_value(document).unwrap_or_default())
    }

    #[instrument(skip(self, token))]
    async fn vote(&self, token: &SecretString, request_id: &str) -> Result<()> {
        let builder = self.request(
            Method::POST,
            &["api", "requests", request_id, "vote"],
            Some(token),
        )?;
        self.execute(Operation::Vote, builder).await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogApi for RemoteApi {
    #[instrument(skip(self, query), fields(page = query.page))]
    async fn category_page(&self, slug: &str, query: &CatalogQuery) -> Result<CatalogPage> {
        let builder = self
            .request(Method::GET, &["api", "apps", "category", slug], None)?
            .query(&query.to_query_pairs());
        self.execute_json(Operation::CategoryPage, builder).await
    }

    #[instrument(skip(self))]
    async fn search(&self, term: &str, limit: u32) -> Result<Vec<AppItem>> {
        let builder = self
            .request(Method::GET, &["api", "apps", "search"], None)?
            .query(&[("q", term.to_string()), ("limit", limit.to_string())]);
        let value = self.execute_value(Operation::Search, builder).await?;

        if value.is_array() {
            return serde_json::from_value(value)
                .map_err(|e| DomainError::Decode(format!("search results: {e}")));
        }
        let page: CatalogPage = serde_json::from_value(value)
            .map_err(|e| DomainError::Decode(format!("search results: {e}")))?;
        Ok(page.apps)
    }
}

#[async_trait]
impl AdminCatalogApi for RemoteApi {
    #[instrument(skip_all, fields(title = %draft.title, files = attachments.len()))]
    async fn create_app(
        &self,
        token: &SecretString,
        draft: &AppDraft,
        attachments: Vec<Attachment>,
    ) -> Result<AppItem> {
        let mut form = draft_form(draft);
        for attachment in attachments {
            let part = Part::bytes(attachment.data.to_vec())
                .file_name(attachment.file_name)
                .mime_str(attachment.content_type.as_ref())
                .map_err(|e| DomainError::Validation(format!("attachment type: {e}")))?;
            form = form.part(attachment.field, part);
        }

        let builder = self
            .request(Method::POST, &["api", "apps", "admin", "create"], Some(token))?
            .multipart(form);
        let value = self.execute_value(Operation::CreateApp, builder).await?;
        app_from(value)
    }

    #[instrument(skip(self, token, draft))]
    async fn edit_app(&self, token: &SecretString, id: &str, draft: &AppDraft) -> Result<AppItem> {
        let builder = self
            .request(Method::PUT, &["api", "apps", "edit", id], Some(token))?
            .json(draft);
        let value = self.execute_value(Operation::EditApp, builder).await?;
        app_from(value)
    }

    #[instrument(skip(self, token))]
    async fn get_app(&self, token: &SecretString, id: &str) -> Result<AppItem> {
        let builder = self.request(Method::GET, &["api", "apps", "get", id], Some(token))?;
        let value = self.execute_value(Operation::GetApp, builder).await?;
        app_from(value)
    }
}

#[async_trait]
impl UserApi for RemoteApi {
    #[instrument(skip_all)]
    async fn me(&self, token: &SecretString) -> Result<Claims> {
        let builder = self.request(Method::GET, &["api", "user", "me"], Some(token))?;
        let value = self.execute_value(Operation::Me, builder).await?;
        serde_json::from_value(unwrap_document(value, &["user", "data"]))
            .map_err(|e| DomainError::Decode(format!("user: {e}")))
    }
}

fn app_from(value: serde_json::Value) -> Result<AppItem> {
    serde_json::from_value(unwrap_document(value, &["app", "data"]))
        .map_err(|e| DomainError::Decode(format!("app: {e}")))
}

/// Text fields of the multipart create form. Optional fields are omitted.
fn draft_form(draft: &AppDraft) -> Form {
    let mut form = Form::new()
        .text("title", draft.title.clone())
        .text("description", draft.description.clone())
        .text("category", draft.category.clone())
        .text("platform", draft.platform.clone())
        .text("isPaid", draft.is_paid.to_string())
        .text("tags", draft.tags.join(","));

    let optional = [
        ("price", draft.price.map(|p| p.to_string())),
        ("size", draft.size.clone()),
        ("gameMode", draft.game_mode.clone()),
        ("releaseYear", draft.release_year.map(|y| y.to_string())),
        ("downloadLink", draft.download_link.clone()),
    ];
    for (name, value) in optional {
        if let Some(value) = value {
            form = form.text(name, value);
        }
    }
    form
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use domains::Platform;
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    use super::*;

    async fn serve(router: Router) -> RemoteApi {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        RemoteApi::new(
            &format!("http://{addr}"),
            SecretString::from("svc-token"),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn header(headers: &HeaderMap, name: &str) -> String {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    #[tokio::test]
    async fn test_vote_sends_both_tokens_and_maps_429() {
        let router = Router::new().route(
            "/api/requests/{id}/vote",
            post(|Path(id): Path<String>, headers: HeaderMap| async move {
                assert_eq!(id, "r1");
                assert_eq!(header(&headers, "x-auth-token"), "svc-token");
                assert_eq!(header(&headers, "authorization"), "Bearer user-token");
                (StatusCode::TOO_MANY_REQUESTS, Json(json!({ "message": "limit" })))
            }),
        );
        let api = serve(router).await;

        let err = api
            .vote(&SecretString::from("user-token"), "r1")
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::DailyVoteUsed);
    }

    #[tokio::test]
    async fn test_vote_403_new_account() {
        let router = Router::new().route(
            "/api/requests/{id}/vote",
            post(|| async {
                (
                    StatusCode::FORBIDDEN,
                    Json(json!({ "message": "Account must be 7 days old", "daysLeft": 3 })),
                )
            }),
        );
        let api = serve(router).await;

        let err = api.vote(&SecretString::from("t"), "r1").await.unwrap_err();
        assert_eq!(err, DomainError::AccountTooNew { days_left: 3 });
    }

    #[tokio::test]
    async fn test_list_accepts_wrapped_payload() {
        let router = Router::new().route(
            "/api/requests",
            get(|headers: HeaderMap| async move {
                assert!(headers.get("authorization").is_none());
                Json(json!({ "requests": [
                    { "_id": "a", "title": "A", "platform": "PC", "status": "pending", "votes": 2 },
                    { "_id": "b", "title": "B", "platform": "Mac", "status": "approved" }
                ]}))
            }),
        );
        let api = serve(router).await;

        let list = api.list_requests().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].votes, 2);
        assert_eq!(list[1].votes, 0);
    }

    #[tokio::test]
    async fn test_submit_429_and_success_receipt() {
        let router = Router::new().route(
            "/api/requests",
            post(|Json(body): Json<Value>| async move {
                if body["title"] == "Again" {
                    return (
                        StatusCode::TOO_MANY_REQUESTS,
                        Json(json!({ "nextRequestAvailable": "2025-04-02T10:00:00Z" })),
                    );
                }
                assert_eq!(body["platform"], "PC");
                (
                    StatusCode::CREATED,
                    Json(json!({ "request": { "_id": "n1", "createdAt": "2025-03-26T10:00:00Z" } })),
                )
            }),
        );
        let api = serve(router).await;
        let token = SecretString::from("t");

        let receipt = api
            .submit_request(
                &token,
                &NewRequest {
                    title: "Celeste".into(),
                    platform: Platform::Pc,
                    steam_link: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(receipt.id.as_deref(), Some("n1"));

        let err = api
            .submit_request(
                &token,
                &NewRequest {
                    title: "Again".into(),
                    platform: Platform::Pc,
                    steam_link: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::QuotaExceeded {
                next_available: Some(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_search_passes_term_and_limit() {
        let router = Router::new().route(
            "/api/apps/search",
            get(
                |Query(params): Query<std::collections::HashMap<String, String>>| async move {
                    assert_eq!(params.get("q").map(String::as_str), Some("hollow knight"));
                    assert_eq!(params.get("limit").map(String::as_str), Some("8"));
                    Json(json!([{ "_id": "g1", "title": "Hollow Knight", "size": 9 }]))
                },
            ),
        );
        let api = serve(router).await;

        let hits = api.search("hollow knight", 8).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].size.as_deref(), Some("9"));
    }

    #[tokio::test]
    async fn test_missing_quota_endpoint_is_not_found() {
        let api = serve(Router::new()).await;
        let err = api.quota(&SecretString::from("t")).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_me_unwraps_user_document() {
        let router = Router::new().route(
            "/api/user/me",
            get(|| async { Json(json!({ "user": { "_id": "u1", "role": "ADMIN" } })) }),
        );
        let api = serve(router).await;

        let claims = api.me(&SecretString::from("t")).await.unwrap();
        assert_eq!(claims.id.as_deref(), Some("u1"));
    }
}
