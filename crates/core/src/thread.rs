//! Thread materialization.
//!
//! The backend returns discussion messages as flat lists. [`build_threads`]
//! turns such a list into reply trees without consulting anything but the
//! list itself, so it works on any slice of a conversation.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::{Message, MessageId};

/// A message together with its replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadNode {
    #[serde(flatten)]
    pub message: Message,
    #[serde(default)]
    pub replies: Vec<ThreadNode>,
}

impl ThreadNode {
    #[must_use]
    pub const fn id(&self) -> &MessageId {
        &self.message.id
    }

    /// Number of messages in this subtree, including this one.
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.replies.iter().map(Self::len).sum::<usize>()
    }

    /// A node always contains at least its own message.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Find a message anywhere in this subtree.
    #[must_use]
    pub fn find(&self, id: &MessageId) -> Option<&Self> {
        if self.id() == id {
            return Some(self);
        }
        self.replies.iter().find_map(|reply| reply.find(id))
    }

    /// Depth-first, pre-order walk of the subtree.
    pub fn walk(&self) -> impl Iterator<Item = &Self> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.replies.iter().rev());
            Some(node)
        })
    }
}

/// Build reply trees from a flat list of messages.
///
/// Messages are grouped by `parent_id` and attached under their parent,
/// starting from the messages without a parent. Roots and every `replies`
/// list are ordered by ascending `date_created`, ties broken by id. A message
/// whose parent is not in the list becomes a root of its own.
#[must_use]
pub fn build_threads(messages: Vec<Message>) -> Vec<ThreadNode> {
    let present: HashSet<MessageId> = messages.iter().map(|m| m.id.clone()).collect();

    let mut roots = Vec::new();
    let mut children: HashMap<MessageId, Vec<Message>> = HashMap::new();

    for message in messages {
        match &message.parent_id {
            Some(parent) if parent != &message.id && present.contains(parent) => {
                children.entry(parent.clone()).or_default().push(message);
            }
            _ => roots.push(message),
        }
    }

    sort_chronologically(&mut roots);
    for siblings in children.values_mut() {
        sort_chronologically(siblings);
    }

    roots
        .into_iter()
        .map(|root| attach(root, &mut children))
        .collect()
}

fn attach(message: Message, children: &mut HashMap<MessageId, Vec<Message>>) -> ThreadNode {
    // Removing the entry before recursing means each group is consumed once.
    let replies = children
        .remove(&message.id)
        .unwrap_or_default()
        .into_iter()
        .map(|reply| attach(reply, children))
        .collect();
    ThreadNode { message, replies }
}

fn sort_chronologically(messages: &mut [Message]) {
    messages.sort_by(|a, b| {
        a.date_created
            .cmp(&b.date_created)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;
    use crate::types::{AuthorType, ThreadId, TopicId};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn msg(id: &str, parent: Option<&str>, minutes: i64, level: u32) -> Message {
        Message {
            id: MessageId::new(id),
            content: format!("message {id}"),
            author: "reader".to_string(),
            author_type: AuthorType::User,
            date_created: t0() + Duration::minutes(minutes),
            parent_id: parent.map(MessageId::new),
            thread_id: ThreadId::new("t1"),
            topic_id: TopicId::new("topic"),
            level,
            is_edited: false,
            is_hidden: false,
        }
    }

    #[test]
    fn test_root_with_two_replies_in_date_order() {
        let threads = build_threads(vec![
            msg("1", None, 0, 0),
            msg("3", Some("1"), 2, 1),
            msg("2", Some("1"), 1, 1),
        ]);

        assert_eq!(threads.len(), 1);
        let root = &threads[0];
        assert_eq!(root.id().as_str(), "1");
        let reply_ids: Vec<&str> = root.replies.iter().map(|r| r.id().as_str()).collect();
        assert_eq!(reply_ids, vec!["2", "3"]);
    }

    #[test]
    fn test_nested_replies() {
        let threads = build_threads(vec![
            msg("1", None, 0, 0),
            msg("2", Some("1"), 1, 1),
            msg("4", Some("2"), 3, 2),
            msg("3", Some("2"), 2, 2),
        ]);

        let root = &threads[0];
        assert_eq!(root.len(), 4);
        let nested: Vec<&str> = root.replies[0]
            .replies
            .iter()
            .map(|r| r.id().as_str())
            .collect();
        assert_eq!(nested, vec!["3", "4"]);
        for node in root.walk() {
            for reply in &node.replies {
                assert_eq!(reply.message.level, node.message.level + 1);
            }
        }
    }

    #[test]
    fn test_multiple_roots_ordered() {
        let threads = build_threads(vec![msg("b", None, 5, 0), msg("a", None, 1, 0)]);
        let ids: Vec<&str> = threads.iter().map(|t| t.id().as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_orphan_becomes_root() {
        let threads = build_threads(vec![msg("1", None, 0, 0), msg("9", Some("missing"), 1, 3)]);
        assert_eq!(threads.len(), 2);
        assert!(threads.iter().any(|t| t.id().as_str() == "9"));
    }

    #[test]
    fn test_same_timestamp_breaks_tie_by_id() {
        let threads = build_threads(vec![
            msg("1", None, 0, 0),
            msg("c", Some("1"), 1, 1),
            msg("b", Some("1"), 1, 1),
        ]);
        let ids: Vec<&str> = threads[0].replies.iter().map(|r| r.id().as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(build_threads(Vec::new()).is_empty());
    }

    #[test]
    fn test_find_and_walk() {
        let threads = build_threads(vec![
            msg("1", None, 0, 0),
            msg("2", Some("1"), 1, 1),
            msg("3", Some("2"), 2, 2),
        ]);
        let root = &threads[0];
        assert!(root.find(&MessageId::new("3")).is_some());
        assert!(root.find(&MessageId::new("7")).is_none());
        let order: Vec<&str> = root.walk().map(|n| n.id().as_str()).collect();
        assert_eq!(order, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_serializes_with_nested_replies() {
        let threads = build_threads(vec![msg("1", None, 0, 0), msg("2", Some("1"), 1, 1)]);
        let json = serde_json::to_value(&threads[0]).unwrap();
        assert_eq!(json["id"], "1");
        assert_eq!(json["replies"][0]["id"], "2");
        assert_eq!(json["replies"][0]["parentId"], "1");
    }
}
