//! # Request board
//!
//! View state of the community request page for one visitor: requests
//! grouped by status, per-section "load more" reveal counts, optimistic vote
//! counts and the two-step vote confirmation.
//!
//! A vote that the API accepted bumps the local count straight away, but the
//! request is only marked as voted once the visitor dismisses the success
//! notice with [`RequestBoard::acknowledge`].

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use domains::{GameRequest, Notice, RequestStatus, Session, VOTE_QUORUM};
use serde::Serialize;

use crate::voting::VoteOutcome;

/// Cards revealed per section initially and per "load more".
pub const DEFAULT_REVEAL_STEP: usize = 6;

/// Static copy for each status section. These figures are presentation
/// constants, not statistics over the fetched requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusPresentation {
    pub status: RequestStatus,
    pub heading: &'static str,
    pub description: &'static str,
    pub success_rate: &'static str,
    pub est_time: &'static str,
}

pub const STATUS_PRESENTATION: [StatusPresentation; 4] = [
    StatusPresentation {
        status: RequestStatus::Pending,
        heading: "Pending",
        description: "Collecting votes. Requests without 20 votes are removed after 7 days.",
        success_rate: "65%",
        est_time: "1-7 days",
    },
    StatusPresentation {
        status: RequestStatus::Processing,
        heading: "Processing",
        description: "Reached quorum or picked by the team, being prepared for upload.",
        success_rate: "90%",
        est_time: "1-3 days",
    },
    StatusPresentation {
        status: RequestStatus::Approved,
        heading: "Approved",
        description: "Uploaded and available in the catalog.",
        success_rate: "100%",
        est_time: "Done",
    },
    StatusPresentation {
        status: RequestStatus::Rejected,
        heading: "Rejected",
        description: "Could not be fulfilled. Removed after 3 days.",
        success_rate: "0%",
        est_time: "N/A",
    },
];

pub fn presentation(status: RequestStatus) -> &'static StatusPresentation {
    match status {
        RequestStatus::Pending => &STATUS_PRESENTATION[0],
        RequestStatus::Processing => &STATUS_PRESENTATION[1],
        RequestStatus::Approved => &STATUS_PRESENTATION[2],
        RequestStatus::Rejected => &STATUS_PRESENTATION[3],
    }
}

/// Share of the quorum reached, in whole percent, capped at 100.
pub fn progress_percent(votes: u32) -> u8 {
    let capped = votes.min(VOTE_QUORUM);
    // capped <= VOTE_QUORUM, so the result is at most 100
    (capped * 100 / VOTE_QUORUM) as u8
}

/// Coarse "time ago" label.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    let (value, unit) = match secs {
        0..=59 => return "just now".to_string(),
        60..=3_599 => (secs / 60, "minute"),
        3_600..=86_399 => (secs / 3_600, "hour"),
        86_400..=2_591_999 => (secs / 86_400, "day"),
        2_592_000..=31_535_999 => (secs / 2_592_000, "month"),
        _ => (secs / 31_536_000, "year"),
    };
    if value == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{value} {unit}s ago")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestCard {
    pub id: String,
    pub title: String,
    pub platform: String,
    pub steam_link: Option<String>,
    pub status: RequestStatus,
    pub votes: u32,
    /// Only set for pending requests
    pub progress_percent: Option<u8>,
    pub time_ago: Option<String>,
    pub can_vote: bool,
    pub voted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardSection {
    pub status: RequestStatus,
    pub presentation: StatusPresentation,
    pub cards: Vec<RequestCard>,
    pub total: usize,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardView {
    pub sections: Vec<BoardSection>,
    /// Set once a vote was refused because the account is too new; the
    /// page then shows a permanent card instead of the grid.
    pub new_account_days_left: Option<u32>,
    /// Notice still waiting for the visitor to dismiss it
    pub notice: Option<Notice>,
}

#[derive(Debug, Clone)]
pub struct RequestBoard {
    reveal_step: usize,
    reveal: HashMap<RequestStatus, usize>,
    /// User the vote flags below belong to; `None` for a guest
    owner: Option<String>,
    voted: HashSet<String>,
    in_flight: HashSet<String>,
    /// Counted votes not yet visible upstream, keyed by request id with the
    /// vote count the request had when the vote was cast
    counted: HashMap<String, u32>,
    awaiting_ack: Option<String>,
    notice: Option<Notice>,
    new_account_days_left: Option<u32>,
}

impl Default for RequestBoard {
    fn default() -> Self {
        Self::new(DEFAULT_REVEAL_STEP)
    }
}

impl RequestBoard {
    pub fn new(reveal_step: usize) -> Self {
        Self {
            reveal_step: reveal_step.max(1),
            reveal: HashMap::new(),
            owner: None,
            voted: HashSet::new(),
            in_flight: HashSet::new(),
            counted: HashMap::new(),
            awaiting_ack: None,
            notice: None,
            new_account_days_left: None,
        }
    }

    /// Hands the board to the user of `session`. When the user changed, the
    /// vote flags, pending notice and new-account lock of the previous one are
    /// dropped; reveal counts stay.
    pub fn bind(&mut self, session: &Session) {
        let user = session.user_id();
        if self.owner.as_deref() == user {
            return;
        }
        self.owner = user.map(str::to_string);
        self.voted.clear();
        self.in_flight.clear();
        self.counted.clear();
        self.awaiting_ack = None;
        self.notice = None;
        self.new_account_days_left = None;
    }

    pub fn revealed(&self, status: RequestStatus) -> usize {
        self.reveal.get(&status).copied().unwrap_or(self.reveal_step)
    }

    pub fn load_more(&mut self, status: RequestStatus) {
        let next = self.revealed(status).saturating_add(self.reveal_step);
        self.reveal.insert(status, next);
    }

    /// Vote count to display: the upstream count, plus this user's counted
    /// vote until the upstream count moves.
    pub fn votes(&self, request: &GameRequest) -> u32 {
        match self.counted.get(&request.id) {
            Some(&base) if base == request.votes => base.saturating_add(1),
            _ => request.votes,
        }
    }

    pub fn is_voted(&self, session: &Session, request: &GameRequest) -> bool {
        self.voted.contains(&request.id)
            || session.user_id().is_some_and(|uid| request.has_voter(uid))
    }

    /// Whether the vote control for `request` is enabled.
    pub fn can_vote(&self, session: &Session, request: &GameRequest) -> bool {
        if session.is_guest() || self.new_account_days_left.is_some() {
            return false;
        }
        request.status == RequestStatus::Pending
            && !self.is_voted(session, request)
            && !self.in_flight.contains(&request.id)
    }

    /// Claims the vote control. Returns `false` if the vote must not be sent
    /// (already voted, not pending, or a vote for it is still in flight).
    pub fn begin_vote(&mut self, session: &Session, request: &GameRequest) -> bool {
        if !self.can_vote(session, request) {
            return false;
        }
        self.in_flight.insert(request.id.clone())
    }

    /// Applies the API's answer to a vote started with [`begin_vote`].
    ///
    /// [`begin_vote`]: RequestBoard::begin_vote
    pub fn finish_vote(&mut self, request: &GameRequest, outcome: &VoteOutcome) -> Notice {
        self.in_flight.remove(&request.id);

        match outcome {
            VoteOutcome::Counted => {
                self.counted.insert(request.id.clone(), request.votes);
                self.awaiting_ack = Some(request.id.clone());
            }
            VoteOutcome::AccountTooNew { days_left } => {
                self.new_account_days_left = Some(*days_left);
            }
            _ => {}
        }

        self.show(outcome.notice())
    }

    /// Records a notice that did not come from a claimed vote (guest clicks).
    pub fn show(&mut self, notice: Notice) -> Notice {
        self.notice = Some(notice.clone());
        notice
    }

    /// Releases the claim of a vote that never got an answer (the caller
    /// went away mid-request). The request stays votable.
    pub fn abandon_vote(&mut self, request_id: &str) {
        self.in_flight.remove(request_id);
    }

    /// Dismisses the current notice. A pending vote confirmation becomes a
    /// permanent "voted" mark; returns the request id it applied to.
    pub fn acknowledge(&mut self) -> Option<String> {
        self.notice = None;
        let id = self.awaiting_ack.take()?;
        self.voted.insert(id.clone());
        Some(id)
    }

    pub fn view(
        &self,
        requests: &[GameRequest],
        session: &Session,
        now: DateTime<Utc>,
    ) -> BoardView {
        let sections = RequestStatus::DISPLAY_ORDER
            .iter()
            .map(|&status| {
                let matching: Vec<&GameRequest> =
                    requests.iter().filter(|r| r.status == status).collect();
                let shown = self.revealed(status).min(matching.len());
                let cards = matching
                    .iter()
                    .take(shown)
                    .map(|request| self.card(session, request, now))
                    .collect();
                BoardSection {
                    status,
                    presentation: *presentation(status),
                    cards,
                    total: matching.len(),
                    has_more: matching.len() > shown,
                }
            })
            .collect();

        BoardView {
            sections,
            new_account_days_left: self.new_account_days_left,
            notice: self.notice.clone(),
        }
    }

    fn card(&self, session: &Session, request: &GameRequest, now: DateTime<Utc>) -> RequestCard {
        let votes = self.votes(request);
        RequestCard {
            id: request.id.clone(),
            title: request.title.clone(),
            platform: request.platform.clone(),
            steam_link: request.steam_link.clone(),
            status: request.status,
            votes,
            progress_percent: (request.status == RequestStatus::Pending)
                .then(|| progress_percent(votes)),
            time_ago: request.relevant_timestamp().map(|at| time_ago(at, now)),
            can_vote: self.can_vote(session, request),
            voted: self.is_voted(session, request),
        }
    }
}
