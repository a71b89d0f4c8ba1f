//! Question and answer reads and writes.

use std::sync::Arc;

use lampstand_core::{Answer, AnswerId, AnswerInput, NewQuestion, Page, Question, QuestionId};
use serde_json::Value;
use tracing::instrument;

use super::params::QuestionListParams;
use super::{ApiClient, segment};
use crate::cache::{MutationKind, QueryFamily, QueryKey};
use crate::error::Result;
use crate::gateway::ApiRequest;

impl ApiClient {
    /// Public question list.
    ///
    /// # Errors
    ///
    /// Fails if the request fails.
    #[instrument(skip(self))]
    pub async fn questions(&self, params: &QuestionListParams) -> Result<Arc<Page<Question>>> {
        let key = QueryKey::new(QueryFamily::Questions, params)?;
        let req = ApiRequest::get("/questions").with_query(params)?;
        self.query(key, self.gateway.fetch_page(&req)).await
    }

    /// One question with its answers.
    ///
    /// # Errors
    ///
    /// Fails if the request fails or the question does not exist.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn question(&self, id: &QuestionId) -> Result<Arc<Question>> {
        let key = QueryKey::scoped(QueryFamily::Question, id.as_str());
        let req = ApiRequest::get(format!("/questions/{}", segment(id)));
        self.query(key, self.gateway.fetch_data(&req)).await
    }

    /// Ask a question.
    ///
    /// # Errors
    ///
    /// Fails if the request fails; nothing is invalidated then.
    #[instrument(skip(self, input), fields(topic_id = %input.topic_id))]
    pub async fn create_question(&self, input: &NewQuestion) -> Result<Question> {
        let req = ApiRequest::post("/questions").with_json(input)?;
        self.mutate(MutationKind::CreateQuestion, self.gateway.fetch_data(&req)).await
    }

    /// Delete a question and its answers.
    ///
    /// # Errors
    ///
    /// Fails if the request fails; nothing is invalidated then.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_question(&self, id: &QuestionId) -> Result<()> {
        let req = ApiRequest::delete(format!("/questions/{}", segment(id)));
        self.mutate(MutationKind::DeleteQuestion, async {
            self.gateway.request::<Value>(&req).await.map(|_| ())
        })
        .await
    }

    /// Answer a question.
    ///
    /// # Errors
    ///
    /// Fails if the request fails; nothing is invalidated then.
    #[instrument(skip(self, input), fields(question_id = %question_id))]
    pub async fn add_answer(
        &self,
        question_id: &QuestionId,
        input: &AnswerInput,
    ) -> Result<Answer> {
        let req = ApiRequest::post(format!("/questions/{}/answers", segment(question_id)))
            .with_json(input)?;
        self.mutate(MutationKind::AddAnswer, self.gateway.fetch_data(&req)).await
    }

    /// Edit an answer.
    ///
    /// # Errors
    ///
    /// Fails if the request fails; nothing is invalidated then.
    #[instrument(skip(self, input), fields(question_id = %question_id, answer_id = %answer_id))]
    pub async fn update_answer(
        &self,
        question_id: &QuestionId,
        answer_id: &AnswerId,
        input: &AnswerInput,
    ) -> Result<Answer> {
        let req = ApiRequest::put(format!(
            "/questions/{}/answers/{}",
            segment(question_id),
            segment(answer_id)
        ))
        .with_json(input)?;
        self.mutate(MutationKind::UpdateAnswer, self.gateway.fetch_data(&req)).await
    }

    /// Remove an answer.
    ///
    /// # Errors
    ///
    /// Fails if the request fails; nothing is invalidated then.
    #[instrument(skip(self), fields(question_id = %question_id, answer_id = %answer_id))]
    pub async fn delete_answer(
        &self,
        question_id: &QuestionId,
        answer_id: &AnswerId,
    ) -> Result<()> {
        let req = ApiRequest::delete(format!(
            "/questions/{}/answers/{}",
            segment(question_id),
            segment(answer_id)
        ));
        self.mutate(MutationKind::DeleteAnswer, async {
            self.gateway.request::<Value>(&req).await.map(|_| ())
        })
        .await
    }
}
