//! URL slug helpers for download routes.

use domains::AppItem;

/// Lowercase, hyphen-separated, ASCII-only form of `input`.
///
/// `"Half-Life 2: Episode One"` becomes `"half-life-2-episode-one"`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

fn non_empty(slug: String, placeholder: &str) -> String {
    if slug.is_empty() {
        placeholder.to_string()
    } else {
        slug
    }
}

/// Route of the download page for an unlocked item.
pub fn download_path(platform: &str, item: &AppItem) -> String {
    let title_slug = item
        .slug
        .as_deref()
        .map(slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| non_empty(slugify(&item.title), "item"));
    let platform_slug = non_empty(slugify(platform), "game");

    format!("/download/{platform_slug}/{title_slug}/{}", item.id)
}
