use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use domains::{
    AdminCatalogApi, CatalogApi, GameRequest, RequestApi, Session, TokenDecoder, UserApi,
    VisitorCounterStore, VisitorId, DEFAULT_PAGE_LIMIT,
};
use services::board::DEFAULT_REVEAL_STEP;
use services::search::{DEFAULT_RESULT_LIMIT, MIN_QUERY_CHARS};
use services::{
    AdminService, CatalogService, RequestBoard, RequestService, SearchService, SessionResolver,
    VisitorService, VoteService,
};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::metrics::PortalMetrics;

/// Outbound adapters the portal is wired with.
pub struct Ports {
    pub requests: Arc<dyn RequestApi>,
    pub catalog: Arc<dyn CatalogApi>,
    pub admin: Arc<dyn AdminCatalogApi>,
    pub users: Arc<dyn UserApi>,
    pub decoder: Arc<dyn TokenDecoder>,
    pub visitors: Arc<dyn VisitorCounterStore>,
}

#[derive(Debug, Clone)]
pub struct PortalOptions {
    pub page_size: u32,
    pub search_min_chars: usize,
    pub search_limit: u32,
    pub reveal_step: usize,
    /// Board state of a visitor is dropped after this much inactivity
    pub board_idle: Duration,
    pub max_boards: usize,
}

impl Default for PortalOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_LIMIT,
            search_min_chars: MIN_QUERY_CHARS,
            search_limit: DEFAULT_RESULT_LIMIT,
            reveal_step: DEFAULT_REVEAL_STEP,
            board_idle: Duration::from_secs(60 * 60),
            max_boards: 10_000,
        }
    }
}

/// State shared across all axum handlers.
pub struct AppState {
    pub sessions: SessionResolver,
    pub requests: RequestService,
    pub votes: VoteService,
    pub catalog: CatalogService,
    pub search: SearchService,
    pub admin: AdminService,
    pub visitors: VisitorService,
    pub request_list: RequestSnapshot,
    pub boards: BoardStore,
    pub metrics: PortalMetrics,
}

impl AppState {
    pub fn new(ports: Ports, options: PortalOptions) -> Self {
        Self {
            sessions: SessionResolver::new(ports.decoder, ports.users),
            requests: RequestService::new(Arc::clone(&ports.requests)),
            votes: VoteService::new(ports.requests),
            catalog: CatalogService::new(Arc::clone(&ports.catalog))
                .with_page_limit(options.page_size),
            search: SearchService::new(ports.catalog)
                .with_limits(options.search_min_chars, options.search_limit),
            admin: AdminService::new(ports.admin),
            visitors: VisitorService::new(ports.visitors),
            request_list: RequestSnapshot::default(),
            boards: BoardStore::new(options.reveal_step, options.board_idle)
                .with_capacity(options.max_boards),
            metrics: PortalMetrics::new(),
        }
    }
}

/// Latest request list fetched from the API, shared by every visitor.
#[derive(Default)]
pub struct RequestSnapshot {
    latest: RwLock<Arc<Vec<GameRequest>>>,
}

impl RequestSnapshot {
    pub async fn replace(&self, requests: Vec<GameRequest>) -> Arc<Vec<GameRequest>> {
        let fresh = Arc::new(requests);
        *self.latest.write().await = Arc::clone(&fresh);
        fresh
    }

    pub async fn current(&self) -> Arc<Vec<GameRequest>> {
        Arc::clone(&*self.latest.read().await)
    }
}

struct BoardEntry {
    board: RequestBoard,
    touched: Instant,
}

/// Request board view state per visitor id. Only flags and reveal counts
/// are kept here; the request list itself lives in [`RequestSnapshot`].
///
/// Closures passed to the accessors run under the map's shard lock and must
/// not await.
pub struct BoardStore {
    boards: DashMap<VisitorId, BoardEntry>,
    reveal_step: usize,
    idle: Duration,
    capacity: usize,
}

impl BoardStore {
    pub fn new(reveal_step: usize, idle: Duration) -> Self {
        Self {
            boards: DashMap::new(),
            reveal_step,
            idle,
            capacity: usize::MAX,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    fn fresh_board(&self, session: &Session) -> RequestBoard {
        let mut board = RequestBoard::new(self.reveal_step);
        board.bind(session);
        board
    }

    /// Runs `f` on the visitor's board, bound to the user of `session`,
    /// creating the board if needed. When the store is full and nothing is
    /// idle, `f` runs on a board that is not kept.
    pub fn with_board<R>(
        &self,
        visitor: &VisitorId,
        session: &Session,
        f: impl FnOnce(&mut RequestBoard) -> R,
    ) -> R {
        if !self.boards.contains_key(visitor) && self.boards.len() >= self.capacity {
            self.prune_idle();
            if self.boards.len() >= self.capacity {
                warn!(capacity = self.capacity, "board store full, state not kept");
                return f(&mut self.fresh_board(session));
            }
        }

        let mut entry = self
            .boards
            .entry(visitor.clone())
            .or_insert_with(|| BoardEntry {
                board: RequestBoard::new(self.reveal_step),
                touched: Instant::now(),
            });
        entry.touched = Instant::now();
        entry.board.bind(session);
        f(&mut entry.board)
    }

    /// Like [`with_board`](Self::with_board) but never stores anything: a
    /// visitor without a board sees a fresh one.
    pub fn read<R>(
        &self,
        visitor: &VisitorId,
        session: &Session,
        f: impl FnOnce(&RequestBoard) -> R,
    ) -> R {
        match self.boards.get_mut(visitor) {
            Some(mut entry) => {
                entry.touched = Instant::now();
                entry.board.bind(session);
                f(&entry.board)
            }
            None => f(&self.fresh_board(session)),
        }
    }

    /// Releases a vote claim, if the visitor still has a board.
    pub fn release_vote(&self, visitor: &VisitorId, request_id: &str) {
        if let Some(mut entry) = self.boards.get_mut(visitor) {
            entry.board.abandon_vote(request_id);
        }
    }

    /// Drops boards nobody touched within the idle window.
    pub fn prune_idle(&self) -> usize {
        let before = self.boards.len();
        self.boards.retain(|_, entry| entry.touched.elapsed() < self.idle);
        let pruned = before.saturating_sub(self.boards.len());
        if pruned > 0 {
            debug!(pruned, remaining = self.boards.len(), "idle request boards dropped");
        }
        pruned
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{Claims, RequestStatus, SessionSource};
    use secrecy::SecretString;

    fn signed_in(id: &str) -> Session {
        Session::authenticated(
            SecretString::from("tok"),
            Claims {
                id: Some(id.into()),
                ..Claims::default()
            },
            SessionSource::Decoded,
        )
    }

    #[test]
    fn test_boards_are_per_visitor() {
        let store = BoardStore::new(2, Duration::from_secs(60));
        let session = Session::guest();
        let a = VisitorId::generate();
        let b = VisitorId::generate();

        store.with_board(&a, &session, |board| board.load_more(RequestStatus::Pending));
        assert_eq!(store.read(&a, &session, |board| board.revealed(RequestStatus::Pending)), 4);
        assert_eq!(store.read(&b, &session, |board| board.revealed(RequestStatus::Pending)), 2);
        assert_eq!(store.len(), 1, "reads do not create boards");
    }

    #[test]
    fn test_prune_idle() {
        let store = BoardStore::new(6, Duration::ZERO);
        store.with_board(&VisitorId::generate(), &Session::guest(), |_| ());
        assert_eq!(store.prune_idle(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_capacity_is_a_hard_limit() {
        let store = BoardStore::new(6, Duration::from_secs(60)).with_capacity(3);
        let session = signed_in("u1");
        let kept: Vec<_> = (0..3).map(|_| VisitorId::generate()).collect();
        for visitor in &kept {
            store.with_board(visitor, &session, |board| board.load_more(RequestStatus::Pending));
        }

        let late = VisitorId::generate();
        store.with_board(&late, &session, |board| board.load_more(RequestStatus::Pending));
        assert_eq!(store.len(), 3);
        assert_eq!(store.read(&late, &session, |board| board.revealed(RequestStatus::Pending)), 6);

        // known visitors keep working at capacity
        store.with_board(&kept[0], &session, |board| board.load_more(RequestStatus::Pending));
        assert_eq!(store.read(&kept[0], &session, |board| board.revealed(RequestStatus::Pending)), 18);
    }

    #[tokio::test]
    async fn test_request_snapshot_replace() {
        let snapshot = RequestSnapshot::default();
        assert!(snapshot.current().await.is_empty());
        let request: GameRequest = serde_json::from_value(serde_json::json!({
            "_id": "r1", "title": "A", "platform": "PC", "status": "pending"
        }))
        .unwrap();
        snapshot.replace(vec![request]).await;
        assert_eq!(snapshot.current().await[0].id, "r1");
    }
}
