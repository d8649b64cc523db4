//! Askama page templates. Handlers build these from service views; the
//! templates themselves live in `templates/`.

use askama::Template;
use domains::{Category, QuotaStatus, CATEGORIES};
use services::board::BoardView;
use services::catalog::CatalogView;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub title: &'a str,
    pub categories: &'a [Category],
    pub viewer: Option<&'a str>,
}

impl<'a> IndexTemplate<'a> {
    pub fn new(viewer: Option<&'a str>) -> Self {
        Self {
            title: "Game Vault",
            categories: CATEGORIES,
            viewer,
        }
    }
}

#[derive(Template)]
#[template(path = "category.html")]
pub struct CategoryTemplate<'a> {
    pub title: String,
    pub view: &'a CatalogView,
    /// Filter inputs echoed back into the form
    pub tags: String,
    pub sort_by: &'a str,
    pub game_mode: &'a str,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
    pub is_admin: bool,
}

#[derive(Template)]
#[template(path = "requests.html")]
pub struct RequestsTemplate<'a> {
    pub title: &'a str,
    pub board: &'a BoardView,
    pub quota: &'a QuotaStatus,
    pub signed_in: bool,
}
