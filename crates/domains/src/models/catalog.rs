use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::string_or_number;

/// Default number of items per catalog page.
pub const DEFAULT_PAGE_LIMIT: u32 = 48;

/// Hard cap so a crafted `limit` cannot ask the API for everything at once.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A browsable catalog section. Every category page is rendered by the same
/// browser, parameterized by one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    /// Path segment used by the API (`/api/apps/category/{slug}`)
    pub slug: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    /// Platform name used when building download slugs
    pub platform: &'static str,
}

pub const CATEGORIES: &[Category] = &[
    Category { slug: "mac", label: "Mac Games", icon: "apple", platform: "mac" },
    Category { slug: "pc", label: "PC Games", icon: "windows", platform: "pc" },
    Category { slug: "android", label: "Android Games", icon: "android", platform: "android" },
    Category { slug: "ps2-iso", label: "PS2 ISOs", icon: "playstation", platform: "ps2" },
    Category { slug: "ps3-iso", label: "PS3 ISOs", icon: "playstation", platform: "ps3" },
    Category { slug: "ppsspp-iso", label: "PPSSPP ISOs", icon: "playstation", platform: "psp" },
];

pub fn find_category(slug: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.slug.eq_ignore_ascii_case(slug))
}

/// A catalog entry as served by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub size: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub game_mode: Option<String>,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One page of a category listing. The API names the list `apps` on some
/// routes and `data` on others.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogPage {
    #[serde(alias = "data", default)]
    pub apps: Vec<AppItem>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Singleplayer,
    Multiplayer,
    Online,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Singleplayer => "singleplayer",
            Self::Multiplayer => "multiplayer",
            Self::Online => "online",
        }
    }
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "singleplayer" | "single" => Ok(Self::Singleplayer),
            "multiplayer" | "multi" => Ok(Self::Multiplayer),
            "online" => Ok(Self::Online),
            other => Err(format!("unknown game mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Newest,
    Oldest,
    Popular,
    NameAsc,
    NameDesc,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Popular => "popular",
            Self::NameAsc => "name_asc",
            Self::NameDesc => "name_desc",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "popular" => Ok(Self::Popular),
            "name_asc" => Ok(Self::NameAsc),
            "name_desc" => Ok(Self::NameDesc),
            other => Err(format!("unknown sort key '{other}'")),
        }
    }
}

/// Filter and paging state of a category page.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    pub page: u32,
    pub limit: u32,
    pub tags: Vec<String>,
    pub game_mode: Option<GameMode>,
    /// Upper size bound in GB
    pub size_limit: Option<u32>,
    pub release_year: Option<i32>,
    pub sort_by: Option<SortKey>,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            tags: Vec::new(),
            game_mode: None,
            size_limit: None,
            release_year: None,
            sort_by: None,
        }
    }
}

impl CatalogQuery {
    /// Query parameters for the category endpoint. Unset filters are left
    /// out entirely rather than sent empty.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.max(1).to_string()),
            ("limit", self.limit.clamp(1, MAX_PAGE_LIMIT).to_string()),
        ];
        if !self.tags.is_empty() {
            pairs.push(("tags", self.tags.join(",")));
        }
        if let Some(mode) = self.game_mode {
            pairs.push(("gameMode", mode.as_str().to_string()));
        }
        if let Some(size) = self.size_limit {
            pairs.push(("sizeLimit", size.to_string()));
        }
        if let Some(year) = self.release_year {
            pairs.push(("releaseYear", year.to_string()));
        }
        if let Some(sort) = self.sort_by {
            pairs.push(("sortBy", sort.as_str().to_string()));
        }
        pairs
    }

    pub fn page_info(&self, total: u64) -> PageInfo {
        PageInfo::new(self.page, self.limit, total)
    }
}

/// Offset pagination derived from `page`, `limit` and the reported total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_prev: bool,
    pub has_next: bool,
}

impl PageInfo {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_LIMIT);
        let total_pages = total.div_ceil(u64::from(limit));
        let total_pages = u32::try_from(total_pages).unwrap_or(u32::MAX);
        Self {
            page,
            limit,
            total,
            total_pages,
            has_prev: page > 1,
            has_next: page < total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filters_only_send_paging() {
        let query = CatalogQuery::default();
        assert_eq!(
            query.to_query_pairs(),
            vec![("page", "1".to_string()), ("limit", "48".to_string())]
        );
    }

    #[test]
    fn test_full_filter_maps_to_api_names() {
        let query = CatalogQuery {
            page: 3,
            limit: 24,
            tags: vec!["rpg".into(), "indie".into()],
            game_mode: Some(GameMode::Multiplayer),
            size_limit: Some(20),
            release_year: Some(2019),
            sort_by: Some(SortKey::Popular),
        };
        let pairs = query.to_query_pairs();
        assert!(pairs.contains(&("tags", "rpg,indie".to_string())));
        assert!(pairs.contains(&("gameMode", "multiplayer".to_string())));
        assert!(pairs.contains(&("sizeLimit", "20".to_string())));
        assert!(pairs.contains(&("releaseYear", "2019".to_string())));
        assert!(pairs.contains(&("sortBy", "popular".to_string())));
    }

    #[test]
    fn test_page_info_rounds_up() {
        let info = PageInfo::new(2, 48, 97);
        assert_eq!(info.total_pages, 3);
        assert!(info.has_prev);
        assert!(info.has_next);

        let last = PageInfo::new(3, 48, 97);
        assert!(!last.has_next);

        let empty = PageInfo::new(1, 48, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
    }

    #[test]
    fn test_catalog_page_accepts_data_alias() {
        let page: CatalogPage = serde_json::from_value(serde_json::json!({
            "data": [{ "_id": "a1", "title": "Doom", "size": 2.5 }],
            "total": 1
        }))
        .unwrap();
        assert_eq!(page.apps.len(), 1);
        assert_eq!(page.apps[0].size.as_deref(), Some("2.5"));
    }

    #[test]
    fn test_find_category_is_case_insensitive() {
        assert_eq!(find_category("PS2-ISO").map(|c| c.platform), Some("ps2"));
        assert!(find_category("xbox").is_none());
    }
}
