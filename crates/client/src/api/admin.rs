//! Admin moderation views of questions and answers.

use std::sync::Arc;

use lampstand_core::{
    AdminAnswerView, AdminQuestionView, Page, Priority, QuestionId, QuestionStatus,
};
use serde_json::{Value, json};
use tracing::instrument;

use super::params::{AdminAnswerParams, AdminQuestionParams};
use super::{ApiClient, segment};
use crate::cache::{MutationKind, QueryFamily, QueryKey};
use crate::error::Result;
use crate::gateway::ApiRequest;

impl ApiClient {
    /// Questions annotated with status and priority.
    ///
    /// # Errors
    ///
    /// Fails if the request fails.
    #[instrument(skip(self))]
    pub async fn admin_questions(
        &self,
        params: &AdminQuestionParams,
    ) -> Result<Arc<Page<AdminQuestionView>>> {
        let key = QueryKey::new(QueryFamily::AdminQuestions, params)?;
        let req = ApiRequest::get("/admin/questions").with_query(params)?;
        self.query(key, self.gateway.fetch_page(&req)).await
    }

    /// Answers with the question they belong to.
    ///
    /// # Errors
    ///
    /// Fails if the request fails.
    #[instrument(skip(self))]
    pub async fn admin_answers(
        &self,
        params: &AdminAnswerParams,
    ) -> Result<Arc<Page<AdminAnswerView>>> {
        let key = QueryKey::new(QueryFamily::AdminAnswers, params)?;
        let req = ApiRequest::get("/admin/answers").with_query(params)?;
        self.query(key, self.gateway.fetch_page(&req)).await
    }

    /// Set a question's moderation status.
    ///
    /// # Errors
    ///
    /// Fails if the request fails; nothing is invalidated then.
    #[instrument(skip(self), fields(id = %id, status = %status))]
    pub async fn update_question_status(
        &self,
        id: &QuestionId,
        status: QuestionStatus,
    ) -> Result<()> {
        let req = ApiRequest::patch(format!("/admin/questions/{}/status", segment(id)))
            .with_json(&json!({ "status": status }))?;
        self.mutate(MutationKind::UpdateQuestionStatus, async {
            self.gateway.request::<Value>(&req).await.map(|_| ())
        })
        .await
    }

    /// Set a question's triage priority.
    ///
    /// # Errors
    ///
    /// Fails if the request fails; nothing is invalidated then.
    #[instrument(skip(self), fields(id = %id, priority = %priority))]
    pub async fn update_question_priority(
        &self,
        id: &QuestionId,
        priority: Priority,
    ) -> Result<()> {
        let req = ApiRequest::patch(format!("/admin/questions/{}/priority", segment(id)))
            .with_json(&json!({ "priority": priority }))?;
        self.mutate(MutationKind::UpdateQuestionPriority, async {
            self.gateway.request::<Value>(&req).await.map(|_| ())
        })
        .await
    }
}
