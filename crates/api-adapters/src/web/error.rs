//! HTTP mapping of [`DomainError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::DomainError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("template rendering failed: {0}")]
    Render(#[from] askama::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Domain(e) => match e {
                DomainError::Validation(_) => StatusCode::BAD_REQUEST,
                DomainError::QuotaExceeded { .. } | DomainError::DailyVoteUsed => {
                    StatusCode::TOO_MANY_REQUESTS
                }
                DomainError::AccountTooNew { .. } => StatusCode::FORBIDDEN,
                DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                DomainError::NotFound(_) => StatusCode::NOT_FOUND,
                DomainError::Upstream { .. } | DomainError::Decode(_) => StatusCode::BAD_GATEWAY,
                DomainError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Domain(e) => match e {
                DomainError::Validation(_) => "VALIDATION",
                DomainError::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
                DomainError::DailyVoteUsed => "DAILY_VOTE_USED",
                DomainError::AccountTooNew { .. } => "ACCOUNT_TOO_NEW",
                DomainError::Unauthorized(_) => "UNAUTHORIZED",
                DomainError::NotFound(_) => "NOT_FOUND",
                DomainError::Upstream { .. } => "UPSTREAM",
                DomainError::Transport(_) => "UPSTREAM_UNAVAILABLE",
                DomainError::Decode(_) => "UPSTREAM_PAYLOAD",
            },
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Render(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let message = match &self {
            Self::Render(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        let mut body = json!({ "code": self.code(), "message": message });
        match &self {
            Self::Domain(DomainError::AccountTooNew { days_left }) => {
                body["daysLeft"] = json!(days_left);
            }
            Self::Domain(DomainError::QuotaExceeded { next_available }) => {
                body["nextRequestAvailable"] = json!(next_available);
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(DomainError::NotFound("category".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(DomainError::Transport("timeout".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(DomainError::Upstream {
                status: 500,
                message: String::new()
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(DomainError::AccountTooNew { days_left: 2 }).status(),
            StatusCode::FORBIDDEN
        );
    }
}
