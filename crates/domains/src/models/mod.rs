//! # Domain Models
//!
//! These structs mirror the JSON documents served by the remote catalog API.
//! Field names follow the API's camelCase convention through serde renames.

pub mod admin;
pub mod catalog;
pub mod notice;
pub mod request;
pub mod session;
pub mod visitor;

pub use admin::*;
pub use catalog::*;
pub use notice::*;
pub use request::*;
pub use session::*;
pub use visitor::*;

use serde::{Deserialize, Deserializer, Serialize};

/// A reference to another document. The API returns either the bare id or
/// the populated document, depending on the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    Id(String),
    Doc {
        #[serde(rename = "_id", alias = "id")]
        id: String,
    },
}

impl EntityRef {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Doc { id } => id,
        }
    }
}

/// Accepts `"12 GB"` as well as `12` for loosely typed display fields.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
