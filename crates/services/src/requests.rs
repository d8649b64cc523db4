//! Request submission flow: client-side validation, read-only quota check
//! and the submit call itself.

use std::sync::Arc;

use domains::{
    DomainError, GameRequest, NewRequest, Notice, Platform, QuotaStatus, RequestApi, Session,
    TITLE_MAX_CHARS,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::notices;

static STEAM_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(store\.)?steampowered\.com/").expect("invalid steam link pattern")
});

/// Raw form input, exactly as the browser posts it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestForm {
    pub title: String,
    pub platform: String,
    pub steam_link: String,
    /// Release/DRM policy checkbox
    pub acknowledged: bool,
}

impl RequestForm {
    /// Turns the form into an API payload or explains what is wrong.
    pub fn validate(&self) -> Result<NewRequest, DomainError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(DomainError::Validation("Please enter a game title.".into()));
        }
        if title.chars().count() > TITLE_MAX_CHARS {
            return Err(DomainError::Validation(format!(
                "Titles are limited to {TITLE_MAX_CHARS} characters."
            )));
        }

        let platform: Platform = self
            .platform
            .parse()
            .map_err(|_| DomainError::Validation("Please choose PC or Mac.".into()))?;

        let steam_link = match self.steam_link.trim() {
            "" => None,
            link if STEAM_LINK.is_match(link) => Some(link.to_string()),
            _ => {
                return Err(DomainError::Validation(
                    "Steam links must point to store.steampowered.com.".into(),
                ))
            }
        };

        if !self.acknowledged {
            return Err(DomainError::Validation(
                "Please confirm you have read the release and DRM policy.".into(),
            ));
        }

        Ok(NewRequest {
            title: title.to_string(),
            platform,
            steam_link,
        })
    }
}

/// Result of a submission attempt, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionView {
    pub notice: Notice,
    /// The form should be reset to its empty state
    pub clear_form: bool,
    pub quota: QuotaStatus,
}

pub struct RequestService {
    api: Arc<dyn RequestApi>,
}

impl RequestService {
    pub fn new(api: Arc<dyn RequestApi>) -> Self {
        Self { api }
    }

    /// Every request on the board, all statuses.
    pub async fn all(&self) -> Result<Vec<GameRequest>, DomainError> {
        let requests = self.api.list_requests().await?;
        debug!(count = requests.len(), "request board fetched");
        Ok(requests)
    }

    /// Weekly quota for the session's user.
    ///
    /// Guests and APIs without the quota endpoint report "available"; the
    /// submit call remains the authority.
    pub async fn quota(&self, session: &Session) -> Result<QuotaStatus, DomainError> {
        let Some(token) = session.token() else {
            return Ok(QuotaStatus::available());
        };

        match self.api.quota(token).await {
            Ok(status) => Ok(status),
            Err(DomainError::NotFound(_)) => {
                debug!("quota endpoint unavailable, assuming a request is allowed");
                Ok(QuotaStatus::available())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn submit(&self, session: &Session, form: &RequestForm) -> SubmissionView {
        let current_quota = QuotaStatus::available();

        let Some(token) = session.token() else {
            return SubmissionView {
                notice: Notice::warning("Login required", notices::LOGIN_TO_REQUEST),
                clear_form: false,
                quota: current_quota,
            };
        };

        let new_request = match form.validate() {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "request form rejected before submission");
                let message = match e {
                    DomainError::Validation(message) => message,
                    other => other.to_string(),
                };
                return SubmissionView {
                    notice: notices::validation(message),
                    clear_form: false,
                    quota: current_quota,
                };
            }
        };

        match self.api.submit_request(token, &new_request).await {
            Ok(receipt) => {
                let next = receipt.next_eligible_at();
                info!(
                    request_id = receipt.id.as_deref().unwrap_or("unknown"),
                    platform = %new_request.platform,
                    "game request submitted"
                );
                SubmissionView {
                    notice: notices::request_submitted(next),
                    clear_form: true,
                    quota: QuotaStatus::exhausted(next),
                }
            }
            Err(DomainError::QuotaExceeded { next_available }) => SubmissionView {
                notice: notices::quota_exceeded(next_available),
                clear_form: false,
                quota: QuotaStatus::exhausted(next_available),
            },
            Err(e) => {
                warn!(error = %e, "game request submission failed");
                SubmissionView {
                    notice: notices::generic(&e),
                    clear_form: false,
                    quota: current_quota,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use domains::{Claims, MockRequestApi, NoticeKind, SessionSource, SubmitReceipt};
    use secrecy::SecretString;

    fn user_session() -> Session {
        Session::authenticated(
            SecretString::from("tok"),
            Claims {
                id: Some("u1".into()),
                ..Claims::default()
            },
            SessionSource::Decoded,
        )
    }

    fn valid_form() -> RequestForm {
        RequestForm {
            title: "Outer Wilds".into(),
            platform: "PC".into(),
            steam_link: "https://store.steampowered.com/app/753640".into(),
            acknowledged: true,
        }
    }

    #[test]
    fn test_validation_rules() {
        assert!(valid_form().validate().is_ok());

        let long = RequestForm {
            title: "x".repeat(TITLE_MAX_CHARS),
            ..valid_form()
        };
        assert!(long.validate().is_ok());

        let too_long = RequestForm {
            title: "x".repeat(TITLE_MAX_CHARS + 1),
            ..valid_form()
        };
        assert!(too_long.validate().is_err());

        let no_platform = RequestForm {
            platform: String::new(),
            ..valid_form()
        };
        assert!(no_platform.validate().is_err());

        let android = RequestForm {
            platform: "Android".into(),
            ..valid_form()
        };
        assert!(android.validate().is_err());

        let unchecked = RequestForm {
            acknowledged: false,
            ..valid_form()
        };
        assert!(unchecked.validate().is_err());

        let no_link = RequestForm {
            steam_link: "  ".into(),
            ..valid_form()
        };
        assert_eq!(no_link.validate().unwrap().steam_link, None);

        let plain_http = RequestForm {
            steam_link: "http://steampowered.com/app/1".into(),
            ..valid_form()
        };
        assert!(plain_http.validate().is_ok());
    }

    #[tokio::test]
    async fn test_bad_steam_link_never_reaches_network() {
        let mut api = MockRequestApi::new();
        api.expect_submit_request().never();
        let service = RequestService::new(Arc::new(api));

        for link in [
            "https://steamcommunity.com/app/1",
            "store.steampowered.com/app/1",
            "https://evil.com/?https://store.steampowered.com/",
        ] {
            let form = RequestForm {
                steam_link: link.into(),
                ..valid_form()
            };
            let view = service.submit(&user_session(), &form).await;
            assert_eq!(view.notice.kind, NoticeKind::Error);
            assert!(!view.clear_form);
        }
    }

    #[tokio::test]
    async fn test_success_clears_form_and_exhausts_quota() {
        let created = Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap();
        let mut api = MockRequestApi::new();
        api.expect_submit_request()
            .withf(|_, req| req.title == "Outer Wilds" && req.platform == Platform::Pc)
            .times(1)
            .returning(move |_, _| {
                Ok(SubmitReceipt {
                    id: Some("r1".into()),
                    created_at: Some(created),
                })
            });
        let service = RequestService::new(Arc::new(api));

        let view = service.submit(&user_session(), &valid_form()).await;
        assert_eq!(view.notice.kind, NoticeKind::Success);
        assert!(view.clear_form);
        assert!(!view.quota.can_request);
        assert_eq!(
            view.quota.next_request_available,
            Some(Utc.with_ymd_and_hms(2025, 5, 8, 8, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn test_quota_exceeded_keeps_next_available() {
        let next = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let mut api = MockRequestApi::new();
        api.expect_submit_request().returning(move |_, _| {
            Err(DomainError::QuotaExceeded {
                next_available: Some(next),
            })
        });
        let service = RequestService::new(Arc::new(api));

        let view = service.submit(&user_session(), &valid_form()).await;
        assert_eq!(view.notice.title, "Request limit exceeded");
        assert_eq!(view.quota.next_request_available, Some(next));
        assert!(!view.clear_form);
    }

    #[tokio::test]
    async fn test_other_failures_use_server_message_or_fallback() {
        let mut api = MockRequestApi::new();
        let mut calls = 0;
        api.expect_submit_request().times(2).returning(move |_, _| {
            calls += 1;
            if calls == 1 {
                Err(DomainError::Upstream {
                    status: 500,
                    message: "Database offline".into(),
                })
            } else {
                Err(DomainError::Transport("connection reset".into()))
            }
        });
        let service = RequestService::new(Arc::new(api));

        let first = service.submit(&user_session(), &valid_form()).await;
        assert_eq!(first.notice.message, "Database offline");

        let second = service.submit(&user_session(), &valid_form()).await;
        assert_eq!(second.notice.message, notices::GENERIC_FAILURE);
    }

    #[tokio::test]
    async fn test_guest_cannot_submit() {
        let mut api = MockRequestApi::new();
        api.expect_submit_request().never();
        let service = RequestService::new(Arc::new(api));

        let view = service.submit(&Session::guest(), &valid_form()).await;
        assert_eq!(view.notice.message, notices::LOGIN_TO_REQUEST);
    }

    #[tokio::test]
    async fn test_quota_check_tolerates_missing_endpoint() {
        let mut api = MockRequestApi::new();
        api.expect_quota()
            .returning(|_| Err(DomainError::NotFound("quota".into())));
        api.expect_submit_request().never();
        let service = RequestService::new(Arc::new(api));

        let quota = service.quota(&user_session()).await.unwrap();
        assert!(quota.can_request);
    }
}
