//! Fixed notice texts shown by the request and vote flows.

use chrono::{DateTime, Utc};
use domains::{DomainError, Notice};

pub const DAILY_VOTE_USED: &str = "Your daily vote is used. Try again tomorrow.";
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again later.";
pub const LOGIN_TO_VOTE: &str = "Please log in to vote on requests.";
pub const LOGIN_TO_REQUEST: &str = "Please log in to submit a request.";

/// Days shown when a 403 does not say how long the grace period lasts.
pub const DEFAULT_GRACE_DAYS: u32 = 7;

pub fn vote_counted() -> Notice {
    Notice::success("Vote counted", "Thanks! Your vote has been added to this request.")
}

pub fn daily_vote_used() -> Notice {
    Notice::warning("Daily vote used", DAILY_VOTE_USED)
}

pub fn account_too_new(days_left: u32) -> Notice {
    let unit = if days_left == 1 { "day" } else { "days" };
    Notice::warning(
        "Account too new",
        format!(
            "Accounts must be at least 7 days old to vote. You can vote in {days_left} {unit}."
        ),
    )
}

pub fn request_submitted(next_eligible_at: Option<DateTime<Utc>>) -> Notice {
    let message = match next_eligible_at {
        Some(at) => format!(
            "Your request is now pending. You can submit another one after {}.",
            at.format("%Y-%m-%d %H:%M UTC")
        ),
        None => "Your request is now pending. You can submit another one next week.".to_string(),
    };
    Notice::success("Request submitted", message)
}

pub fn quota_exceeded(next_available: Option<DateTime<Utc>>) -> Notice {
    let message = match next_available {
        Some(at) => format!(
            "You can submit one request per week. Next request available {}.",
            at.format("%Y-%m-%d %H:%M UTC")
        ),
        None => "You can submit one request per week.".to_string(),
    };
    Notice::warning("Request limit exceeded", message)
}

pub fn validation(message: impl Into<String>) -> Notice {
    Notice::error("Check your request", message)
}

/// Server message when there is one, fixed fallback otherwise.
pub fn generic(error: &DomainError) -> Notice {
    let message = error.server_message().unwrap_or(GENERIC_FAILURE);
    Notice::error("Error", message)
}
