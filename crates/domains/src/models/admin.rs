use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Editable fields of a catalog entry, as sent to the admin endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_link: Option<String>,
}

/// A file part of the admin create form (thumbnail, screenshots).
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    /// Multipart field name expected by the API
    pub field: String,
    pub file_name: String,
    pub content_type: mime::Mime,
    pub data: Bytes,
}
