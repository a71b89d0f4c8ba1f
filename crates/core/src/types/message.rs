//! Discussion message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{MessageId, ThreadId, TopicId};
use super::status::AuthorType;

/// One message in a topic discussion.
///
/// Messages form trees: a message with no `parent_id` starts a thread at
/// level 0, each reply sits one level below its parent, and every message in
/// a tree shares the root's `thread_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(flatten, with = "super::id::document_id")]
    pub id: MessageId,
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub author_type: AuthorType,
    pub date_created: DateTime<Utc>,
    #[serde(default)]
    pub parent_id: Option<MessageId>,
    pub thread_id: ThreadId,
    pub topic_id: TopicId,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub is_edited: bool,
    #[serde(default)]
    pub is_hidden: bool,
}

impl Message {
    /// Whether this message starts a thread.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Payload for starting a new thread under a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub content: String,
    pub topic_id: TopicId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Payload for replying to a message or editing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent {
    pub content: String,
}

impl MessageContent {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}
