use std::sync::Arc;

use axum::extract::State;
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use domains::VisitorStats;

use crate::web::error::ApiError;
use crate::web::extract::Visitor;
use crate::web::state::AppState;

/// Counts this browser's visit. A browser without a valid `userId` cookie
/// gets one in the response.
pub async fn record(
    State(state): State<Arc<AppState>>,
    visitor: Visitor,
) -> Result<Response, ApiError> {
    let existing = (!visitor.issued).then_some(visitor.id);
    let record = state.visitors.record(existing, Utc::now()).await?;
    state.metrics.visit();

    let visitor = Visitor {
        id: record.visitor,
        issued: record.issued,
    };
    Ok((AppendHeaders(visitor.set_cookie()), Json(record.stats)).into_response())
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<VisitorStats>, ApiError> {
    Ok(Json(state.visitors.stats(Utc::now()).await?))
}
