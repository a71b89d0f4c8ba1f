//! Topic reads and writes.

use std::sync::Arc;

use lampstand_core::{Page, Topic, TopicId, TopicInput};
use serde_json::{Value, json};
use tracing::instrument;

use super::params::TopicListParams;
use super::{ApiClient, segment};
use crate::cache::{MutationKind, QueryFamily, QueryKey};
use crate::error::Result;
use crate::gateway::ApiRequest;

impl ApiClient {
    // =========================================================================
    // Reads
    // =========================================================================

    /// Public topic list.
    ///
    /// # Errors
    ///
    /// Fails if the request fails.
    #[instrument(skip(self))]
    pub async fn topics(&self, params: &TopicListParams) -> Result<Arc<Page<Topic>>> {
        let key = QueryKey::new(QueryFamily::Topics, params)?;
        let req = ApiRequest::get("/topics").with_query(params)?;
        self.query(key, self.gateway.fetch_page(&req)).await
    }

    /// One topic.
    ///
    /// # Errors
    ///
    /// Fails if the request fails or the topic does not exist.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn topic(&self, id: &TopicId) -> Result<Arc<Topic>> {
        let key = QueryKey::scoped(QueryFamily::Topic, id.as_str());
        let req = ApiRequest::get(format!("/topics/{}", segment(id)));
        self.query(key, self.gateway.fetch_data(&req)).await
    }

    /// Admin topic list, including inactive topics.
    ///
    /// # Errors
    ///
    /// Fails if the request fails.
    #[instrument(skip(self))]
    pub async fn admin_topics(&self, params: &TopicListParams) -> Result<Arc<Page<Topic>>> {
        let key = QueryKey::new(QueryFamily::AdminTopics, params)?;
        let req = ApiRequest::get("/admin/topics").with_query(params)?;
        self.query(key, self.gateway.fetch_page(&req)).await
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Create a topic.
    ///
    /// # Errors
    ///
    /// Fails if the request fails; nothing is invalidated then.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_topic(&self, input: &TopicInput) -> Result<Topic> {
        let req = ApiRequest::post("/topics").with_json(input)?;
        self.mutate(MutationKind::CreateTopic, self.gateway.fetch_data(&req)).await
    }

    /// Replace a topic's content.
    ///
    /// # Errors
    ///
    /// Fails if the request fails; nothing is invalidated then.
    #[instrument(skip(self, input), fields(id = %id))]
    pub async fn update_topic(&self, id: &TopicId, input: &TopicInput) -> Result<Topic> {
        let req = ApiRequest::put(format!("/topics/{}", segment(id))).with_json(input)?;
        self.mutate(MutationKind::UpdateTopic, self.gateway.fetch_data(&req)).await
    }

    /// Delete a topic.
    ///
    /// # Errors
    ///
    /// Fails if the request fails; nothing is invalidated then.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_topic(&self, id: &TopicId) -> Result<()> {
        let req = ApiRequest::delete(format!("/topics/{}", segment(id)));
        self.mutate(MutationKind::DeleteTopic, async {
            self.gateway.request::<Value>(&req).await.map(|_| ())
        })
        .await
    }

    /// Publish or unpublish a topic.
    ///
    /// # Errors
    ///
    /// Fails if the request fails; nothing is invalidated then.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn set_topic_active(&self, id: &TopicId, is_active: bool) -> Result<Topic> {
        let req = ApiRequest::patch(format!("/topics/{}/status", segment(id)))
            .with_json(&json!({ "isActive": is_active }))?;
        self.mutate(MutationKind::ToggleTopicStatus, self.gateway.fetch_data(&req)).await
    }
}
