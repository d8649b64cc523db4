//! JSON endpoints for the catalog grid and the live search widget.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use services::catalog::CatalogView;
use services::{CatalogFilterForm, SearchHit};

use crate::web::error::ApiError;
use crate::web::extract::CurrentSession;
use crate::web::state::AppState;

pub async fn page(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(slug): Path<String>,
    Query(filters): Query<CatalogFilterForm>,
) -> Result<Json<CatalogView>, ApiError> {
    let query = filters.into_query(state.catalog.default_limit());
    Ok(Json(state.catalog.browse(&slug, &query, &session).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub q: String,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchHit>>, ApiError> {
    match state.search.search(&params.q, &session).await {
        Ok(hits) => {
            state.metrics.record("search", "ok");
            Ok(Json(hits))
        }
        Err(e) => {
            state.metrics.record("search", "error");
            Err(e.into())
        }
    }
}
