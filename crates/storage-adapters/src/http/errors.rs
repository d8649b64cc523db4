//! Mapping of remote API failures onto [`DomainError`].

use chrono::{DateTime, Utc};
use domains::DomainError;
use reqwest::StatusCode;

use super::Operation;

/// Legacy wording the API uses for the new-account vote block. Kept as a
/// fallback for servers that do not send a structured `code`.
const ACCOUNT_TOO_NEW_PHRASE: &str = "7 days old";
const ACCOUNT_TOO_NEW_CODE: &str = "ACCOUNT_TOO_NEW";
const DEFAULT_DAYS_LEFT: u32 = 7;

/// Fields we care about in an error body. Parsed leniently: the API is not
/// consistent about types, and some proxies answer with plain text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub code: Option<String>,
    pub days_left: Option<u32>,
    pub next_request_available: Option<DateTime<Utc>>,
}

impl ErrorBody {
    pub fn parse(bytes: &[u8]) -> Self {
        let Ok(value) = serde_json::from_slice::<serde_json::Value>(bytes) else {
            let text = String::from_utf8_lossy(bytes).trim().to_string();
            return Self {
                message: (!text.is_empty() && text.len() <= 300).then_some(text),
                ..Self::default()
            };
        };

        let str_field = |name: &str| value.get(name).and_then(|v| v.as_str()).map(str::to_string);

        let days_left = value.get("daysLeft").and_then(|v| match v {
            serde_json::Value::Number(n) => n.as_u64().and_then(|d| u32::try_from(d).ok()),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });

        let next_request_available = str_field("nextRequestAvailable")
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Self {
            message: str_field("message").or_else(|| str_field("error")),
            code: str_field("code"),
            days_left,
            next_request_available,
        }
    }

    fn message_or_empty(&self) -> String {
        self.message.clone().unwrap_or_default()
    }
}

/// Classifies a non-2xx response for `operation`.
pub fn classify(operation: Operation, status: StatusCode, body: &ErrorBody) -> DomainError {
    match (operation, status) {
        (Operation::SubmitRequest, StatusCode::TOO_MANY_REQUESTS) => DomainError::QuotaExceeded {
            next_available: body.next_request_available,
        },
        (Operation::Vote, StatusCode::TOO_MANY_REQUESTS) => DomainError::DailyVoteUsed,
        (Operation::Vote, StatusCode::FORBIDDEN) if is_account_too_new(body) => {
            DomainError::AccountTooNew {
                days_left: body.days_left.unwrap_or(DEFAULT_DAYS_LEFT),
            }
        }
        (_, StatusCode::UNAUTHORIZED) => DomainError::Unauthorized(body.message_or_empty()),
        (op, StatusCode::NOT_FOUND) => DomainError::NotFound(op.resource().to_string()),
        (_, status) => DomainError::Upstream {
            status: status.as_u16(),
            message: body.message_or_empty(),
        },
    }
}

fn is_account_too_new(body: &ErrorBody) -> bool {
    if body.code.as_deref() == Some(ACCOUNT_TOO_NEW_CODE) {
        return true;
    }
    body.message
        .as_deref()
        .is_some_and(|m| m.contains(ACCOUNT_TOO_NEW_PHRASE))
}

pub fn transport(error: reqwest::Error) -> DomainError {
    if error.is_decode() {
        DomainError::Decode(error.to_string())
    } else {
        DomainError::Transport(error.to_string())
    }
}
