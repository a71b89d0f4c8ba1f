//! Question and answer types, plus the admin views that annotate them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::id::{AnswerId, QuestionId, TopicId};
use super::status::{Priority, QuestionStatus};

/// Pending questions older than this are high priority.
const HIGH_PRIORITY_AGE_DAYS: i64 = 7;
/// Pending questions older than this are medium priority.
const MEDIUM_PRIORITY_AGE_DAYS: i64 = 2;

/// An admin's answer to a community question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    #[serde(flatten, with = "super::id::document_id")]
    pub id: AnswerId,
    pub answer: String,
    pub admin_user: String,
    pub date_answered: DateTime<Utc>,
}

/// A community question attached to a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(flatten, with = "super::id::document_id")]
    pub id: QuestionId,
    pub question: String,
    pub topic_id: TopicId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asked_by: Option<String>,
    pub date_asked: DateTime<Utc>,
    #[serde(default)]
    pub answers: Vec<Answer>,
    /// Count reported by the backend; list endpoints may omit `answers`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_count: Option<usize>,
}

impl Question {
    /// Number of answers, preferring the backend's count when it sent one.
    #[must_use]
    pub fn answer_count(&self) -> usize {
        self.answer_count.unwrap_or(self.answers.len())
    }

    /// A question is pending until it has at least one answer.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.answer_count() == 0
    }
}

/// Payload for asking a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestion {
    pub question: String,
    pub topic_id: TopicId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asked_by: Option<String>,
}

/// Payload for adding or editing an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerInput {
    pub answer: String,
}

// =============================================================================
// Admin Views
// =============================================================================

/// A question annotated with moderation status and triage priority.
///
/// Admin endpoints may send `status` and `priority` alongside the question;
/// when they don't, both are derived from the question itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AdminQuestionRecord")]
pub struct AdminQuestionView {
    #[serde(flatten)]
    pub question: Question,
    pub status: QuestionStatus,
    pub priority: Priority,
}

#[derive(Deserialize)]
struct AdminQuestionRecord {
    #[serde(flatten)]
    question: Question,
    #[serde(default)]
    status: Option<QuestionStatus>,
    #[serde(default)]
    priority: Option<Priority>,
}

impl From<AdminQuestionRecord> for AdminQuestionView {
    fn from(record: AdminQuestionRecord) -> Self {
        let mut view = Self::annotate(record.question, Utc::now());
        if let Some(status) = record.status {
            view.status = status;
        }
        if let Some(priority) = record.priority {
            view.priority = priority;
        }
        view
    }
}

impl AdminQuestionView {
    /// Annotate a question with derived status and priority as of `now`.
    #[must_use]
    pub fn annotate(question: Question, now: DateTime<Utc>) -> Self {
        let status = derive_status(&question);
        let priority = derive_priority(&question, now);
        Self {
            question,
            status,
            priority,
        }
    }
}

/// Pending when unanswered, answered otherwise. Closed is only ever set by
/// the backend.
#[must_use]
pub fn derive_status(question: &Question) -> QuestionStatus {
    if question.is_pending() {
        QuestionStatus::Pending
    } else {
        QuestionStatus::Answered
    }
}

/// Answered questions are low priority; pending ones escalate with age.
#[must_use]
pub fn derive_priority(question: &Question, now: DateTime<Utc>) -> Priority {
    if !question.is_pending() {
        return Priority::Low;
    }
    let age = now - question.date_asked;
    if age >= Duration::days(HIGH_PRIORITY_AGE_DAYS) {
        Priority::High
    } else if age >= Duration::days(MEDIUM_PRIORITY_AGE_DAYS) {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// An answer listed in the admin answers view, with its question context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAnswerView {
    #[serde(flatten)]
    pub answer: Answer,
    pub question_id: QuestionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<TopicId>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn question(date_asked: DateTime<Utc>, answers: usize) -> Question {
        Question {
            id: QuestionId::new("q1"),
            question: "What is grace?".to_string(),
            topic_id: TopicId::new("t1"),
            asked_by: None,
            date_asked,
            answers: (0..answers)
                .map(|i| Answer {
                    id: AnswerId::new(format!("a{i}")),
                    answer: "Unmerited favour.".to_string(),
                    admin_user: "admin".to_string(),
                    date_answered: date_asked,
                })
                .collect(),
            answer_count: None,
        }
    }

    #[test]
    fn test_answer_count_derived_from_answers() {
        let now = Utc::now();
        assert_eq!(question(now, 2).answer_count(), 2);
        assert!(question(now, 0).is_pending());
    }

    #[test]
    fn test_backend_answer_count_wins() {
        let json = r#"{
            "id": 3, "question": "Why?", "topicId": "t1",
            "dateAsked": "2024-03-01T10:00:00Z", "answerCount": 4
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.answer_count(), 4);
        assert!(!q.is_pending());
    }

    #[test]
    fn test_priority_escalates_with_age() {
        let now = Utc::now();
        assert_eq!(derive_priority(&question(now, 0), now), Priority::Low);
        assert_eq!(
            derive_priority(&question(now - Duration::days(3), 0), now),
            Priority::Medium
        );
        assert_eq!(
            derive_priority(&question(now - Duration::days(10), 0), now),
            Priority::High
        );
        assert_eq!(
            derive_priority(&question(now - Duration::days(10), 1), now),
            Priority::Low
        );
    }

    #[test]
    fn test_admin_view_prefers_backend_annotations() {
        let json = r#"{
            "id": "q9", "question": "Is it closed?", "topicId": "t1",
            "dateAsked": "2020-01-01T00:00:00Z",
            "status": "closed", "priority": "low"
        }"#;
        let view: AdminQuestionView = serde_json::from_str(json).unwrap();
        assert_eq!(view.status, QuestionStatus::Closed);
        assert_eq!(view.priority, Priority::Low);
        assert_eq!(view.question.id, QuestionId::new("q9"));
    }

    #[test]
    fn test_admin_view_derives_missing_annotations() {
        let json = r#"{
            "id": "q10", "question": "Old and unanswered", "topicId": "t1",
            "dateAsked": "2020-01-01T00:00:00Z", "answers": []
        }"#;
        let view: AdminQuestionView = serde_json::from_str(json).unwrap();
        assert_eq!(view.status, QuestionStatus::Pending);
        assert_eq!(view.priority, Priority::High);
    }

    #[test]
    fn test_admin_views_accept_both_id_fields() {
        let question = r#"{
            "_id": "q11", "id": "q11", "question": "Both ids?", "topicId": "t1",
            "dateAsked": "2024-03-01T10:00:00Z",
            "answers": [{
                "_id": "a2", "id": "a2", "answer": "Yes.", "adminUser": "pastor",
                "dateAnswered": "2024-03-02T10:00:00Z"
            }]
        }"#;
        let view: AdminQuestionView = serde_json::from_str(question).unwrap();
        assert_eq!(view.question.id, QuestionId::new("q11"));
        assert_eq!(view.status, QuestionStatus::Answered);

        let answer = r#"{
            "_id": "a2", "id": "a2", "answer": "Yes.", "adminUser": "pastor",
            "dateAnswered": "2024-03-02T10:00:00Z", "questionId": "q11"
        }"#;
        let view: AdminAnswerView = serde_json::from_str(answer).unwrap();
        assert_eq!(view.answer.id, AnswerId::new("a2"));
    }

    #[test]
    fn test_admin_answer_view_flattens_answer() {
        let json = r#"{
            "_id": "a1", "answer": "Yes.", "adminUser": "pastor",
            "dateAnswered": "2024-03-02T10:00:00Z",
            "questionId": "q1", "questionText": "Is it?"
        }"#;
        let view: AdminAnswerView = serde_json::from_str(json).unwrap();
        assert_eq!(view.answer.id, AnswerId::new("a1"));
        assert_eq!(view.question_id, QuestionId::new("q1"));
    }
}
