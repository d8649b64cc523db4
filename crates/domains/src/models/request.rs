use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::EntityRef;

/// Longest title the API accepts for a request.
pub const TITLE_MAX_CHARS: usize = 191;

/// Votes a pending request needs before it is prioritised.
pub const VOTE_QUORUM: u32 = 20;

/// Rolling window in which a user may submit a single request.
pub const QUOTA_WINDOW_DAYS: i64 = 7;

/// Days a rejected request stays visible before the API archives it.
pub const REJECTED_RETENTION_DAYS: i64 = 3;

/// Days a pending request without quorum stays visible.
pub const PENDING_RETENTION_DAYS: i64 = 7;

/// Lifecycle status, assigned by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Processing,
    Approved,
    Rejected,
}

impl RequestStatus {
    /// Fixed order in which board sections are displayed.
    pub const DISPLAY_ORDER: [RequestStatus; 4] = [
        RequestStatus::Pending,
        RequestStatus::Processing,
        RequestStatus::Approved,
        RequestStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown request status '{other}'")),
        }
    }
}

/// Platforms a request may be submitted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "PC")]
    Pc,
    #[serde(rename = "Mac")]
    Mac,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pc => "PC",
            Self::Mac => "Mac",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pc" => Ok(Self::Pc),
            "mac" => Ok(Self::Mac),
            "" => Err("platform is required".to_string()),
            other => Err(format!("unsupported platform '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voter {
    pub user: EntityRef,
}

/// A community game request as returned by `GET /api/requests`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRequest {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    /// Kept as text: the board tolerates platforms the form never offers.
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub steam_link: Option<String>,
    pub status: RequestStatus,
    #[serde(default)]
    pub votes: u32,
    #[serde(default)]
    pub voters: Vec<Voter>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub processing_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rejected_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl GameRequest {
    pub fn platform(&self) -> Option<Platform> {
        self.platform.parse().ok()
    }

    pub fn has_voter(&self, user_id: &str) -> bool {
        self.voters.iter().any(|v| v.user.id() == user_id)
    }

    /// The timestamp that matters for the current status, used for
    /// "time ago" labels.
    pub fn relevant_timestamp(&self) -> Option<DateTime<Utc>> {
        let specific = match self.status {
            RequestStatus::Pending => self.created_at,
            RequestStatus::Processing => self.processing_at,
            RequestStatus::Approved => self.approved_at,
            RequestStatus::Rejected => self.rejected_at,
        };
        specific.or(self.updated_at).or(self.created_at)
    }
}

/// Body of `POST /api/requests`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequest {
    pub title: String,
    pub platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steam_link: Option<String>,
}

/// What the API tells us after a successful submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    #[serde(default, rename = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl SubmitReceipt {
    /// Next time the user may submit, when the API reported a creation time.
    pub fn next_eligible_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
            .map(|at| at + Duration::days(QUOTA_WINDOW_DAYS))
    }
}

/// Read-only weekly quota state for the current user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub can_request: bool,
    #[serde(default)]
    pub next_request_available: Option<DateTime<Utc>>,
}

impl QuotaStatus {
    pub fn available() -> Self {
        Self {
            can_request: true,
            next_request_available: None,
        }
    }

    pub fn exhausted(next_request_available: Option<DateTime<Utc>>) -> Self {
        Self {
            can_request: false,
            next_request_available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_relevant_timestamp_follows_status() {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let rejected = Utc.with_ymd_and_hms(2025, 1, 4, 0, 0, 0).unwrap();
        let mut request = GameRequest {
            id: "r1".into(),
            title: "Celeste".into(),
            platform: "Mac".into(),
            steam_link: None,
            status: RequestStatus::Rejected,
            votes: 0,
            voters: vec![],
            created_at: Some(created),
            processing_at: None,
            approved_at: None,
            rejected_at: Some(rejected),
            updated_at: None,
        };
        assert_eq!(request.relevant_timestamp(), Some(rejected));

        request.status = RequestStatus::Approved;
        assert_eq!(request.relevant_timestamp(), Some(created));
    }

    #[test]
    fn test_next_eligible_is_one_week_after_creation() {
        let created = Utc.with_ymd_and_hms(2025, 2, 10, 12, 0, 0).unwrap();
        let receipt = SubmitReceipt {
            id: Some("x".into()),
            created_at: Some(created),
        };
        assert_eq!(
            receipt.next_eligible_at(),
            Some(Utc.with_ymd_and_hms(2025, 2, 17, 12, 0, 0).unwrap())
        );
        assert_eq!(SubmitReceipt::default().next_eligible_at(), None);
    }

    #[test]
    fn test_platform_parsing_is_case_insensitive_and_closed() {
        assert_eq!("pc".parse::<Platform>(), Ok(Platform::Pc));
        assert_eq!("Mac".parse::<Platform>(), Ok(Platform::Mac));
        assert!("Android".parse::<Platform>().is_err());
        assert!("".parse::<Platform>().is_err());
    }
}
