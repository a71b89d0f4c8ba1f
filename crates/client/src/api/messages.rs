//! Discussion messages and threads.

use std::sync::Arc;

use lampstand_core::{
    Message, MessageContent, MessageId, NewMessage, Page, ThreadId, ThreadNode, build_threads,
};
use serde_json::Value;
use tracing::{debug, instrument};

use super::params::{ConversationParams, MessageListParams};
use super::{ApiClient, segment};
use crate::cache::{MutationKind, QueryFamily, QueryKey};
use crate::error::{ApiError, Result};
use crate::gateway::ApiRequest;

impl ApiClient {
    // =========================================================================
    // Reads
    // =========================================================================

    /// Flat message list.
    ///
    /// # Errors
    ///
    /// Fails if the request fails.
    #[instrument(skip(self))]
    pub async fn messages(&self, params: &MessageListParams) -> Result<Arc<Page<Message>>> {
        let key = QueryKey::new(QueryFamily::Messages, params)?;
        let req = ApiRequest::get("/messages").with_query(params)?;
        self.query(key, self.gateway.fetch_page(&req)).await
    }

    /// Conversations of a topic, as reply trees.
    ///
    /// # Errors
    ///
    /// Fails if the request fails.
    #[instrument(skip(self))]
    pub async fn conversations(&self, params: &ConversationParams) -> Result<Arc<Vec<ThreadNode>>> {
        let key = QueryKey::new(QueryFamily::Conversations, params)?;
        let req = ApiRequest::get("/messages/conversations").with_query(params)?;
        self.query(key, async {
            let page = self.gateway.fetch_page::<Message>(&req).await?;
            Ok::<_, ApiError>(build_threads(page.items))
        })
        .await
    }

    /// One thread, rooted at its first message.
    ///
    /// # Errors
    ///
    /// Fails if the request fails or the thread has no messages.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn thread(&self, id: &ThreadId) -> Result<Arc<ThreadNode>> {
        let req = ApiRequest::get(format!("/messages/thread/{}", segment(id)));
        self.query(QueryKey::thread(id), async {
            let messages = self.gateway.fetch_page::<Message>(&req).await?.items;
            select_root(build_threads(messages), id)
                .ok_or_else(|| ApiError::MissingData(req.path.clone()))
        })
        .await
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Start a new thread under a topic.
    ///
    /// # Errors
    ///
    /// Fails if the request fails; nothing is invalidated then.
    #[instrument(skip(self, input), fields(topic_id = %input.topic_id))]
    pub async fn create_message(&self, input: &NewMessage) -> Result<Message> {
        let req = ApiRequest::post("/messages").with_json(input)?;
        self.mutate_in_thread(
            MutationKind::CreateMessage,
            self.gateway.fetch_data::<Message>(&req),
            |message| Some(message.thread_id.clone()),
        )
        .await
    }

    /// Reply to a message.
    ///
    /// # Errors
    ///
    /// Fails if the request fails; nothing is invalidated then.
    #[instrument(skip(self, input), fields(parent_id = %parent_id))]
    pub async fn reply_to_message(
        &self,
        parent_id: &MessageId,
        input: &MessageContent,
    ) -> Result<Message> {
        let req = ApiRequest::post(format!("/messages/{}/reply", segment(parent_id)))
            .with_json(input)?;
        self.mutate_in_thread(
            MutationKind::ReplyToMessage,
            self.gateway.fetch_data::<Message>(&req),
            |message| Some(message.thread_id.clone()),
        )
        .await
    }

    /// Edit a message.
    ///
    /// # Errors
    ///
    /// Fails if the request fails; nothing is invalidated then.
    #[instrument(skip(self, input), fields(id = %id))]
    pub async fn update_message(&self, id: &MessageId, input: &MessageContent) -> Result<Message> {
        let req = ApiRequest::put(format!("/messages/{}", segment(id))).with_json(input)?;
        self.mutate_in_thread(
            MutationKind::UpdateMessage,
            self.gateway.fetch_data::<Message>(&req),
            |message| Some(message.thread_id.clone()),
        )
        .await
    }

    /// Delete a message.
    ///
    /// The backend answers without a body, so `thread` names the thread to
    /// refresh. Without it every cached thread is dropped.
    ///
    /// # Errors
    ///
    /// Fails if the request fails; nothing is invalidated then.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_message(&self, id: &MessageId, thread: Option<&ThreadId>) -> Result<()> {
        let req = ApiRequest::delete(format!("/messages/{}", segment(id)));
        self.moderate(MutationKind::DeleteMessage, &req, thread)
            .await
            .map(|_| ())
    }

    /// Hide a message from public view. Hiding a hidden message succeeds.
    ///
    /// # Errors
    ///
    /// Fails if the request fails; nothing is invalidated then.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn hide_message(
        &self,
        id: &MessageId,
        thread: Option<&ThreadId>,
    ) -> Result<Option<Message>> {
        let req = ApiRequest::patch(format!("/messages/{}/hide", segment(id)));
        self.moderate(MutationKind::HideMessage, &req, thread).await
    }

    /// Make a hidden message visible again.
    ///
    /// # Errors
    ///
    /// Fails if the request fails; nothing is invalidated then.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn unhide_message(
        &self,
        id: &MessageId,
        thread: Option<&ThreadId>,
    ) -> Result<Option<Message>> {
        let req = ApiRequest::patch(format!("/messages/{}/unhide", segment(id)));
        self.moderate(MutationKind::UnhideMessage, &req, thread).await
    }

    /// Message write whose response may or may not carry the message. A body
    /// that is not a message is ignored.
    async fn moderate(
        &self,
        kind: MutationKind,
        req: &ApiRequest,
        thread: Option<&ThreadId>,
    ) -> Result<Option<Message>> {
        self.mutate_in_thread(
            kind,
            async {
                let data = self.gateway.request::<Value>(req).await?.data;
                Ok::<_, ApiError>(
                    data.and_then(|data| serde_json::from_value::<Message>(data).ok()),
                )
            },
            |message| {
                message
                    .as_ref()
                    .map(|message| message.thread_id.clone())
                    .or_else(|| thread.cloned())
            },
        )
        .await
    }
}

/// The tree rooted at `id`, else the earliest root.
fn select_root(mut roots: Vec<ThreadNode>, id: &ThreadId) -> Option<ThreadNode> {
    if let Some(pos) = roots.iter().position(|root| root.id().as_str() == id.as_str()) {
        return Some(roots.swap_remove(pos));
    }
    if roots.len() > 1 {
        debug!(roots = roots.len(), "Thread response has several roots");
    }
    (!roots.is_empty()).then(|| roots.remove(0))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use lampstand_core::{AuthorType, TopicId};

    use super::*;

    fn msg(id: &str, parent: Option<&str>, minute: u32) -> Message {
        Message {
            id: MessageId::new(id),
            content: format!("message {id}"),
            author: "reader".to_string(),
            author_type: AuthorType::User,
            date_created: Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, 0).unwrap(),
            parent_id: parent.map(MessageId::new),
            thread_id: ThreadId::new("1"),
            topic_id: TopicId::new("t1"),
            level: u32::from(parent.is_some()),
            is_edited: false,
            is_hidden: false,
        }
    }

    #[test]
    fn test_select_root_prefers_thread_id() {
        let roots = build_threads(vec![
            msg("0", None, 0),
            msg("1", None, 5),
            msg("2", Some("1"), 6),
        ]);
        let root = select_root(roots, &ThreadId::new("1")).unwrap();
        assert_eq!(root.id().as_str(), "1");
        assert_eq!(root.replies.len(), 1);
    }

    #[test]
    fn test_select_root_falls_back_to_earliest() {
        let roots = build_threads(vec![msg("7", None, 3), msg("5", None, 1)]);
        let root = select_root(roots, &ThreadId::new("missing")).unwrap();
        assert_eq!(root.id().as_str(), "5");
    }

    #[test]
    fn test_select_root_empty() {
        assert!(select_root(Vec::new(), &ThreadId::new("1")).is_none());
    }
}
