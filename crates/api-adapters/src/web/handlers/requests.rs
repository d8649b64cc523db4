//! Request board endpoints: board snapshot, quota, submission, voting and
//! the notice acknowledgement that completes a vote.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use domains::{GameRequest, QuotaStatus, RequestStatus, VisitorId};
use serde::Serialize;
use services::board::BoardView;
use services::{RequestForm, SubmissionView, VoteOutcome};
use tracing::debug;

use crate::web::error::ApiError;
use crate::web::extract::{CurrentSession, Visitor};
use crate::web::state::{AppState, BoardStore};

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    /// `None` when the vote was not sent (already voted, in flight, closed)
    pub outcome: Option<VoteOutcome>,
    pub board: BoardView,
}

#[derive(Debug, Serialize)]
pub struct AckResponse {
    /// Request that is now permanently marked as voted, if any
    pub acknowledged: Option<String>,
    pub board: BoardView,
}

fn with_cookie(visitor: &Visitor, status: StatusCode, body: impl Serialize) -> Response {
    (status, AppendHeaders(visitor.set_cookie()), Json(body)).into_response()
}

/// The shared request list, fetched once if nothing was loaded yet.
async fn request_list(state: &AppState) -> Result<Arc<Vec<GameRequest>>, ApiError> {
    let current = state.request_list.current().await;
    if !current.is_empty() {
        return Ok(current);
    }
    refresh(state).await
}

async fn refresh(state: &AppState) -> Result<Arc<Vec<GameRequest>>, ApiError> {
    let all = state.requests.all().await?;
    Ok(state.request_list.replace(all).await)
}

/// Fresh board: refetches every request and renders this visitor's view.
/// Nothing is stored for the visitor.
pub async fn board(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    visitor: Visitor,
) -> Result<Response, ApiError> {
    let all = refresh(&state).await?;
    let view = state
        .boards
        .read(&visitor.id, &session, |board| board.view(&all, &session, Utc::now()));
    Ok(with_cookie(&visitor, StatusCode::OK, view))
}

pub async fn quota(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<QuotaStatus>, ApiError> {
    Ok(Json(state.requests.quota(&session).await?))
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Json(form): Json<RequestForm>,
) -> Json<SubmissionView> {
    let view = state.requests.submit(&session, &form).await;
    state.metrics.record("submit", view.notice.kind.as_str());
    Json(view)
}

/// Clears a vote claim if the handler is dropped before the API answered.
struct VoteClaim<'a> {
    boards: &'a BoardStore,
    visitor: &'a VisitorId,
    request_id: &'a str,
    settled: bool,
}

impl Drop for VoteClaim<'_> {
    fn drop(&mut self) {
        if !self.settled {
            debug!(request_id = self.request_id, "vote abandoned before completion");
            self.boards.release_vote(self.visitor, self.request_id);
        }
    }
}

pub async fn vote(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    visitor: Visitor,
    Path(request_id): Path<String>,
) -> Result<Response, ApiError> {
    if session.is_guest() {
        let outcome = VoteOutcome::LoginRequired;
        let all = request_list(&state).await?;
        let board = state.boards.with_board(&visitor.id, &session, |board| {
            board.show(outcome.notice());
            board.view(&all, &session, Utc::now())
        });
        state.metrics.record("vote", outcome.as_str());
        let body = VoteResponse {
            outcome: Some(outcome),
            board,
        };
        return Ok(with_cookie(&visitor, StatusCode::OK, body));
    }

    let cached = state.request_list.current().await;
    let all = if cached.iter().any(|r| r.id == request_id) {
        cached
    } else {
        refresh(&state).await?
    };
    let request = all.iter().find(|r| r.id == request_id).cloned();

    let claimed = request.as_ref().is_some_and(|request| {
        state
            .boards
            .with_board(&visitor.id, &session, |board| board.begin_vote(&session, request))
    });
    let Some(request) = request.filter(|_| claimed) else {
        let body = VoteResponse {
            outcome: None,
            board: state
                .boards
                .read(&visitor.id, &session, |board| board.view(&all, &session, Utc::now())),
        };
        return Ok(with_cookie(&visitor, StatusCode::CONFLICT, body));
    };

    let mut claim = VoteClaim {
        boards: &state.boards,
        visitor: &visitor.id,
        request_id: &request_id,
        settled: false,
    };
    let outcome = state.votes.cast(&session, &request_id).await;
    claim.settled = true;
    drop(claim);

    let board = state.boards.with_board(&visitor.id, &session, |board| {
        board.finish_vote(&request, &outcome);
        board.view(&all, &session, Utc::now())
    });
    state.metrics.record("vote", outcome.as_str());

    let body = VoteResponse {
        outcome: Some(outcome),
        board,
    };
    Ok(with_cookie(&visitor, StatusCode::OK, body))
}

/// Dismisses the open notice. After a counted vote this is the step that
/// locks the vote control.
pub async fn acknowledge(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    visitor: Visitor,
) -> Result<Response, ApiError> {
    let all = request_list(&state).await?;
    let (acknowledged, board) = state.boards.with_board(&visitor.id, &session, |board| {
        let acknowledged = board.acknowledge();
        (acknowledged, board.view(&all, &session, Utc::now()))
    });
    Ok(with_cookie(
        &visitor,
        StatusCode::OK,
        AckResponse {
            acknowledged,
            board,
        },
    ))
}

pub async fn load_more(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    visitor: Visitor,
    Path(status): Path<String>,
) -> Result<Response, ApiError> {
    let status: RequestStatus = status.parse().map_err(ApiError::BadRequest)?;
    let all = request_list(&state).await?;
    let view = state.boards.with_board(&visitor.id, &session, |board| {
        board.load_more(status);
        board.view(&all, &session, Utc::now())
    });
    Ok(with_cookie(&visitor, StatusCode::OK, view))
}
