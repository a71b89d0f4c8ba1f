//! Admin dashboard read models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ActivityId;
use super::status::{ActivityAction, ActivityType};

/// One entry in the admin activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(flatten, with = "super::id::document_id")]
    pub id: ActivityId,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub action: ActivityAction,
    pub title: String,
    pub user: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub status: String,
}

/// Counters shown on the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_topics: u64,
    pub active_topics: u64,
    pub total_questions: u64,
    pub pending_questions: u64,
    pub answered_questions: u64,
    pub total_answers: u64,
    pub total_messages: u64,
    pub hidden_messages: u64,
}
