//! Vote casting and the mapping from API outcomes to notices.

use std::sync::Arc;

use domains::{DomainError, Notice, RequestApi, Session};
use serde::Serialize;
use tracing::{info, warn};

use crate::notices;

/// How a vote attempt ended, as far as the UI is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VoteOutcome {
    Counted,
    DailyVoteUsed,
    AccountTooNew { days_left: u32 },
    LoginRequired,
    Failed { message: Option<String> },
}

impl VoteOutcome {
    pub fn from_error(error: &DomainError) -> Self {
        match error {
            DomainError::DailyVoteUsed => Self::DailyVoteUsed,
            DomainError::AccountTooNew { days_left } => Self::AccountTooNew {
                days_left: *days_left,
            },
            DomainError::Unauthorized(_) => Self::LoginRequired,
            other => Self::Failed {
                message: other.server_message().map(str::to_string),
            },
        }
    }

    /// Short label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counted => "counted",
            Self::DailyVoteUsed => "daily_vote_used",
            Self::AccountTooNew { .. } => "account_too_new",
            Self::LoginRequired => "login_required",
            Self::Failed { .. } => "failed",
        }
    }

    /// The modal for this outcome. A daily-vote rejection always shows the
    /// same text, whatever the server said.
    pub fn notice(&self) -> Notice {
        match self {
            Self::Counted => notices::vote_counted(),
            Self::DailyVoteUsed => notices::daily_vote_used(),
            Self::AccountTooNew { days_left } => notices::account_too_new(*days_left),
            Self::LoginRequired => Notice::warning("Login required", notices::LOGIN_TO_VOTE),
            Self::Failed { message } => Notice::error(
                "Vote failed",
                message.as_deref().unwrap_or(notices::GENERIC_FAILURE),
            ),
        }
    }
}

pub struct VoteService {
    api: Arc<dyn RequestApi>,
}

impl VoteService {
    pub fn new(api: Arc<dyn RequestApi>) -> Self {
        Self { api }
    }

    pub async fn cast(&self, session: &Session, request_id: &str) -> VoteOutcome {
        let Some(token) = session.token() else {
            return VoteOutcome::LoginRequired;
        };

        match self.api.vote(token, request_id).await {
            Ok(()) => {
                info!(request_id, user_id = session.user_id().unwrap_or("unknown"), "vote counted");
                VoteOutcome::Counted
            }
            Err(e) => {
                warn!(request_id, error = %e, "vote rejected");
                VoteOutcome::from_error(&e)
            }
        }
    }
}
