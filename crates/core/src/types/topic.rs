//! Topic types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::TopicId;

/// A published topic with its reading content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    #[serde(flatten, with = "super::id::document_id")]
    pub id: TopicId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Scripture references, e.g. "John 3:16".
    #[serde(default)]
    pub scriptures: Vec<String>,
    /// Rich-text body. Kept as the backend's opaque markup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_extract: Option<String>,
    #[serde(default)]
    pub quotes: Vec<String>,
    /// Image URL.
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Topic {
    /// Topics without an explicit flag are treated as active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active.unwrap_or(true)
    }
}

/// Payload for creating or replacing a topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicInput {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scriptures: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_extract: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quotes: Vec<String>,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl TopicInput {
    /// Start a topic payload with the two required fields.
    #[must_use]
    pub fn new(title: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            image: image.into(),
            ..Self::default()
        }
    }
}
