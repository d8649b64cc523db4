//! # Category browser
//!
//! One browser for every catalog category. The category's slug, label and
//! icon come from [`domains::CATEGORIES`]; filtering, paging and download
//! gating are identical for all of them.

use std::sync::Arc;

use domains::{
    find_category, AppItem, CatalogApi, CatalogQuery, Category, DomainError, PageInfo, Session,
    DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::slug::download_path;

/// Filter state as it arrives in the page's query string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogFilterForm {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Comma separated
    pub tags: Option<String>,
    pub game_mode: Option<String>,
    pub size_limit: Option<u32>,
    pub release_year: Option<i32>,
    pub sort_by: Option<String>,
}

impl CatalogFilterForm {
    /// Unknown enum values are dropped rather than rejected, so a stale
    /// bookmark still renders a page.
    pub fn into_query(self, default_limit: u32) -> CatalogQuery {
        let tags = self
            .tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        let game_mode = self.game_mode.as_deref().and_then(|raw| {
            raw.parse()
                .map_err(|e: String| debug!(error = %e, "ignoring game mode filter"))
                .ok()
        });
        let sort_by = self.sort_by.as_deref().and_then(|raw| {
            raw.parse()
                .map_err(|e: String| debug!(error = %e, "ignoring sort key"))
                .ok()
        });

        CatalogQuery {
            page: self.page.unwrap_or(1).max(1),
            limit: self.limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_LIMIT),
            tags,
            game_mode,
            size_limit: self.size_limit.filter(|s| *s > 0),
            release_year: self.release_year.filter(|y| *y > 0),
            sort_by,
        }
    }
}

/// Whether a card links to its download page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum CardAccess {
    Unlocked { href: String },
    Locked,
}

impl CardAccess {
    pub fn href(&self) -> Option<&str> {
        match self {
            Self::Unlocked { href } => Some(href),
            Self::Locked => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogCard {
    pub id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub size: Option<String>,
    pub tags: Vec<String>,
    pub is_paid: bool,
    pub price: Option<f64>,
    pub access: CardAccess,
}

impl CatalogCard {
    pub fn build(platform: &str, item: &AppItem, session: &Session) -> Self {
        let access = if session.can_unlock(item) {
            CardAccess::Unlocked {
                href: download_path(platform, item),
            }
        } else {
            CardAccess::Locked
        };

        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            thumbnail: item.thumbnail.clone(),
            size: item.size.clone(),
            tags: item.tags.clone(),
            is_paid: item.is_paid,
            price: item.price,
            access,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogView {
    pub category: Category,
    pub cards: Vec<CatalogCard>,
    pub page: PageInfo,
}

pub struct CatalogService {
    api: Arc<dyn CatalogApi>,
    default_limit: u32,
}

impl CatalogService {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self {
            api,
            default_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.default_limit = limit.clamp(1, MAX_PAGE_LIMIT);
        self
    }

    pub fn default_limit(&self) -> u32 {
        self.default_limit
    }

    #[instrument(skip(self, query, session), fields(page = query.page))]
    pub async fn browse(
        &self,
        slug: &str,
        query: &CatalogQuery,
        session: &Session,
    ) -> Result<CatalogView, DomainError> {
        let category = find_category(slug)
            .ok_or_else(|| DomainError::NotFound(format!("category '{slug}'")))?;

        let page = self.api.category_page(category.slug, query).await?;
        debug!(items = page.apps.len(), total = page.total, "catalog page fetched");

        let cards = page
            .apps
            .iter()
            .map(|item| CatalogCard::build(category.platform, item, session))
            .collect();

        Ok(CatalogView {
            category: *category,
            cards,
            page: query.page_info(page.total),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{CatalogPage, Claims, EntityRef, GameMode, MockCatalogApi, Role, SessionSource, SortKey};
    use secrecy::SecretString;

    fn item(id: &str, paid: bool) -> AppItem {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "title": format!("Title {id}"),
            "isPaid": paid
        }))
        .unwrap()
    }

    fn session(role: Role, owned: &[&str]) -> Session {
        Session::authenticated(
            SecretString::from("tok"),
            Claims {
                id: Some("u1".into()),
                role,
                purchased_games: owned.iter().map(|o| EntityRef::Id(o.to_string())).collect(),
                ..Claims::default()
            },
            SessionSource::Decoded,
        )
    }

    #[test]
    fn test_filter_form_maps_to_query() {
        let form = CatalogFilterForm {
            page: Some(0),
            limit: Some(500),
            tags: Some(" RPG, ,Indie".into()),
            game_mode: Some("multiplayer".into()),
            size_limit: Some(0),
            release_year: Some(2020),
            sort_by: Some("bogus".into()),
        };
        let query = form.into_query(48);
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, MAX_PAGE_LIMIT);
        assert_eq!(query.tags, vec!["rpg".to_string(), "indie".to_string()]);
        assert_eq!(query.game_mode, Some(GameMode::Multiplayer));
        assert_eq!(query.size_limit, None);
        assert_eq!(query.release_year, Some(2020));
        assert_eq!(query.sort_by, None);

        let sorted = CatalogFilterForm {
            sort_by: Some("name_desc".into()),
            ..CatalogFilterForm::default()
        };
        assert_eq!(sorted.into_query(48).sort_by, Some(SortKey::NameDesc));
    }

    #[tokio::test]
    async fn test_browse_gates_each_card() {
        let mut api = MockCatalogApi::new();
        api.expect_category_page()
            .withf(|slug, q| slug == "pc" && q.page == 2)
            .returning(|_, _| {
                Ok(CatalogPage {
                    apps: vec![item("free", false), item("owned", true), item("paid", true)],
                    total: 99,
                })
            });
        let service = CatalogService::new(Arc::new(api)).with_page_limit(48);

        let query = CatalogQuery {
            page: 2,
            ..CatalogQuery::default()
        };
        let view = service
            .browse("pc", &query, &session(Role::User, &["owned"]))
            .await
            .unwrap();

        assert_eq!(view.category.label, "PC Games");
        assert_eq!(view.page.total_pages, 3);
        assert_eq!(
            view.cards[0].access.href(),
            Some("/download/pc/title-free/free")
        );
        assert!(view.cards[1].access.href().is_some());
        assert_eq!(view.cards[2].access, CardAccess::Locked);
    }

    #[tokio::test]
    async fn test_admin_unlocks_everything() {
        let mut api = MockCatalogApi::new();
        api.expect_category_page().returning(|_, _| {
            Ok(CatalogPage {
                apps: vec![item("paid", true)],
                total: 1,
            })
        });
        let service = CatalogService::new(Arc::new(api));
        let view = service
            .browse("mac", &CatalogQuery::default(), &session(Role::Admin, &[]))
            .await
            .unwrap();
        assert!(matches!(view.cards[0].access, CardAccess::Unlocked { .. }));
    }

    #[tokio::test]
    async fn test_unknown_category_is_not_found() {
        let mut api = MockCatalogApi::new();
        api.expect_category_page().never();
        let service = CatalogService::new(Arc::new(api));
        let err = service
            .browse("xbox", &CatalogQuery::default(), &Session::guest())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
