pub mod admin;
pub mod catalog;
pub mod ops;
pub mod pages;
pub mod requests;
pub mod visitors;

use askama::Template;
use axum::response::Html;

use super::error::ApiError;

fn render(template: &impl Template) -> Result<Html<String>, ApiError> {
    Ok(Html(template.render()?))
}
