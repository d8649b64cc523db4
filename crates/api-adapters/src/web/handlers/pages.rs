//! Server-rendered pages.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::{AppendHeaders, Html, IntoResponse, Response};
use chrono::Utc;
use domains::{CatalogQuery, QuotaStatus};
use services::CatalogFilterForm;
use tracing::warn;

use super::render;
use crate::templates::{CategoryTemplate, IndexTemplate, RequestsTemplate};
use crate::web::error::ApiError;
use crate::web::extract::{CurrentSession, Visitor};
use crate::web::state::AppState;

pub async fn index(CurrentSession(session): CurrentSession) -> Result<Html<String>, ApiError> {
    render(&IndexTemplate::new(session.display_name()))
}

/// First page of a category, rendered server-side. Later pages come from
/// `GET /api/category/{slug}`.
pub async fn category(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(slug): Path<String>,
    Query(filters): Query<CatalogFilterForm>,
) -> Result<Html<String>, ApiError> {
    let query = filters.into_query(state.catalog.default_limit());
    let view = state.catalog.browse(&slug, &query, &session).await?;

    let page = view.page;
    let template = CategoryTemplate {
        title: format!("{} | Game Vault", view.category.label),
        tags: query.tags.join(","),
        sort_by: query.sort_by.map(|s| s.as_str()).unwrap_or("newest"),
        game_mode: query.game_mode.map(|m| m.as_str()).unwrap_or(""),
        prev_href: page.has_prev.then(|| page_href(view.category.slug, &query, page.page - 1)),
        next_href: page.has_next.then(|| page_href(view.category.slug, &query, page.page + 1)),
        is_admin: session.is_admin(),
        view: &view,
    };
    render(&template)
}

pub async fn requests(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    visitor: Visitor,
) -> Result<Response, ApiError> {
    let all = state.requests.all().await?;
    let all = state.request_list.replace(all).await;
    let board = state
        .boards
        .read(&visitor.id, &session, |board| board.view(&all, &session, Utc::now()));

    let quota = state.requests.quota(&session).await.unwrap_or_else(|e| {
        warn!(error = %e, "quota check failed, showing the request form");
        QuotaStatus::available()
    });

    let html = render(&RequestsTemplate {
        title: "Game requests | Game Vault",
        board: &board,
        quota: &quota,
        signed_in: !session.is_guest(),
    })?;
    Ok((AppendHeaders(visitor.set_cookie()), html).into_response())
}

fn page_href(slug: &str, query: &CatalogQuery, page: u32) -> String {
    let params: Vec<(&str, String)> = query
        .to_query_pairs()
        .into_iter()
        .map(|(key, value)| {
            let value = if key == "page" { page.to_string() } else { value };
            (key, value)
        })
        .collect();
    // encoding a flat list of string pairs cannot fail
    let encoded = serde_urlencoded::to_string(&params).unwrap_or_default();
    format!("/category/{slug}?{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::SortKey;

    #[test]
    fn test_page_href_encodes_filters() {
        let query = CatalogQuery {
            page: 1,
            tags: vec!["open world".into(), "co-op".into()],
            sort_by: Some(SortKey::NameAsc),
            ..CatalogQuery::default()
        };

        let href = page_href("pc", &query, 2);
        assert!(href.starts_with("/category/pc?"), "{href}");
        assert!(href.contains("page=2"), "{href}");
        assert!(href.contains("tags=open+world%2Cco-op"), "{href}");
        assert!(href.contains("sortBy=name_asc"), "{href}");
    }
}
