//! Search-as-you-type over the whole catalog.

use std::sync::Arc;

use domains::{find_category, AppItem, CatalogApi, DomainError, Session};
use serde::Serialize;
use tracing::debug;

use crate::catalog::CardAccess;
use crate::slug::download_path;

pub const MIN_QUERY_CHARS: usize = 2;
pub const DEFAULT_RESULT_LIMIT: u32 = 8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub category: Option<String>,
    pub thumbnail: Option<String>,
    pub access: CardAccess,
}

pub struct SearchService {
    api: Arc<dyn CatalogApi>,
    min_chars: usize,
    limit: u32,
}

impl SearchService {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self {
            api,
            min_chars: MIN_QUERY_CHARS,
            limit: DEFAULT_RESULT_LIMIT,
        }
    }

    pub fn with_limits(mut self, min_chars: usize, limit: u32) -> Self {
        self.min_chars = min_chars.max(1);
        self.limit = limit.max(1);
        self
    }

    /// Short queries return nothing without touching the API.
    pub async fn search(&self, term: &str, session: &Session) -> Result<Vec<SearchHit>, DomainError> {
        let term = term.trim();
        if term.chars().count() < self.min_chars {
            return Ok(Vec::new());
        }

        let items = self.api.search(term, self.limit).await?;
        debug!(term, hits = items.len(), "live search");

        Ok(items
            .iter()
            .take(self.limit as usize)
            .map(|item| hit(item, session))
            .collect())
    }
}

fn hit(item: &AppItem, session: &Session) -> SearchHit {
    let platform = item
        .category
        .as_deref()
        .and_then(find_category)
        .map(|c| c.platform)
        .or(item.platform.as_deref())
        .unwrap_or_default();

    let access = if session.can_unlock(item) {
        CardAccess::Unlocked {
            href: download_path(platform, item),
        }
    } else {
        CardAccess::Locked
    };

    SearchHit {
        id: item.id.clone(),
        title: item.title.clone(),
        category: item.category.clone(),
        thumbnail: item.thumbnail.clone(),
        access,
    }
}
