//! Discussion threads: reply-tree reads and moderation writes.

#![allow(clippy::unwrap_used)]

use lampstand_client::ConversationParams;
use lampstand_core::{MessageContent, MessageId, ThreadId, TopicId};
use lampstand_integration_tests::{TestBackend, api_path, failure, message, ok, page};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

/// Root 1 with replies 3 and 2, sent out of order.
fn thread_messages() -> Vec<Value> {
    vec![
        message("1", None, "t1", 0),
        message("3", Some("1"), "t1", 2),
        message("2", Some("1"), "t1", 1),
    ]
}

fn hidden(mut message: Value) -> Value {
    message["isHidden"] = json!(true);
    message
}

fn reply_ids(root: &lampstand_core::ThreadNode) -> Vec<&str> {
    root.replies.iter().map(|reply| reply.id().as_str()).collect()
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn test_thread_is_materialized_as_reply_tree() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("/messages/thread/t1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(thread_messages())))
        .expect(1)
        .mount(&backend.server)
        .await;

    let root = backend.client.thread(&ThreadId::new("t1")).await.unwrap();

    assert_eq!(root.id().as_str(), "1");
    assert_eq!(reply_ids(&root), vec!["2", "3"]);
    assert_eq!(root.len(), 3);
    backend.server.verify().await;
}

#[tokio::test]
async fn test_empty_thread_is_missing_data() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("/messages/thread/gone")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![])))
        .mount(&backend.server)
        .await;

    let err = backend.client.thread(&ThreadId::new("gone")).await.unwrap_err();
    assert!(matches!(err, lampstand_client::ApiError::MissingData(_)));
}

#[tokio::test]
async fn test_conversations_group_messages_by_thread() {
    let backend = TestBackend::start().await;

    let mut messages = thread_messages();
    messages.push(message("9", None, "t2", 5));
    messages.push(message("10", Some("9"), "t2", 6));

    Mock::given(method("GET"))
        .and(path(api_path("/messages/conversations")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(messages)))
        .expect(1)
        .mount(&backend.server)
        .await;

    let params = ConversationParams::for_topic(TopicId::new("t1"));
    let roots = backend.client.conversations(&params).await.unwrap();

    let root_ids: Vec<&str> = roots.iter().map(|root| root.id().as_str()).collect();
    assert_eq!(root_ids, vec!["1", "9"]);
    assert_eq!(reply_ids(roots.first().unwrap()), vec!["2", "3"]);
    backend.server.verify().await;
}

// =============================================================================
// Writes
// =============================================================================

#[tokio::test]
async fn test_reply_refreshes_its_thread() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("/messages/thread/t1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(thread_messages())))
        .up_to_n_times(1)
        .expect(1)
        .mount(&backend.server)
        .await;
    let mut with_reply = thread_messages();
    with_reply.push(message("4", Some("2"), "t1", 3));
    Mock::given(method("GET"))
        .and(path(api_path("/messages/thread/t1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(with_reply)))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("/messages/2/reply")))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(ok(message("4", Some("2"), "t1", 3))),
        )
        .expect(1)
        .mount(&backend.server)
        .await;

    let thread = ThreadId::new("t1");
    assert_eq!(backend.client.thread(&thread).await.unwrap().len(), 3);

    let reply = backend
        .client
        .reply_to_message(&MessageId::new("2"), &MessageContent::new("Amen"))
        .await
        .unwrap();
    assert_eq!(reply.thread_id, thread);

    let root = backend.client.thread(&thread).await.unwrap();
    assert_eq!(root.len(), 4);
    assert!(root.find(&MessageId::new("4")).is_some());
    backend.server.verify().await;
}

#[tokio::test]
async fn test_hiding_twice_settles_on_the_same_state() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("/messages/thread/t1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(thread_messages())))
        .up_to_n_times(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("/messages/thread/t1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![
            message("1", None, "t1", 0),
            message("3", Some("1"), "t1", 2),
            hidden(message("2", Some("1"), "t1", 1)),
        ])))
        .mount(&backend.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(api_path("/messages/2/hide")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(ok(hidden(message("2", Some("1"), "t1", 1)))),
        )
        .expect(2)
        .mount(&backend.server)
        .await;

    let thread = ThreadId::new("t1");
    let id = MessageId::new("2");

    let before = backend.client.thread(&thread).await.unwrap();
    assert!(!before.find(&id).unwrap().message.is_hidden);

    let first = backend.client.hide_message(&id, None).await.unwrap();
    assert!(first.unwrap().is_hidden);
    let after_first = backend.client.thread(&thread).await.unwrap();

    backend.client.hide_message(&id, None).await.unwrap();
    let after_second = backend.client.thread(&thread).await.unwrap();

    assert!(after_first.find(&id).unwrap().message.is_hidden);
    assert_eq!(*after_first, *after_second);
    backend.server.verify().await;
}

#[tokio::test]
async fn test_delete_with_thread_hint_refreshes_that_thread() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("/messages/thread/t1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(thread_messages())))
        .expect(2)
        .mount(&backend.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(api_path("/messages/3")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&backend.server)
        .await;

    let thread = ThreadId::new("t1");
    backend.client.thread(&thread).await.unwrap();
    backend
        .client
        .delete_message(&MessageId::new("3"), Some(&thread))
        .await
        .unwrap();
    backend.client.thread(&thread).await.unwrap();

    backend.server.verify().await;
}

#[tokio::test]
async fn test_failed_hide_keeps_cached_thread() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("/messages/thread/t1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(thread_messages())))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(api_path("/messages/2/hide")))
        .respond_with(ResponseTemplate::new(403).set_body_json(failure("Admin access required")))
        .expect(1)
        .mount(&backend.server)
        .await;

    let thread = ThreadId::new("t1");
    let before = backend.client.thread(&thread).await.unwrap();

    let err = backend
        .client
        .hide_message(&MessageId::new("2"), Some(&thread))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));

    let after = backend.client.thread(&thread).await.unwrap();
    assert!(std::sync::Arc::ptr_eq(&before, &after));
    backend.server.verify().await;
}
