//! Questions, answers and the admin views derived from them.

#![allow(clippy::unwrap_used)]

use lampstand_client::{ActivityParams, AdminQuestionParams, QuestionListParams};
use lampstand_core::{AnswerInput, NewQuestion, Priority, QuestionId, QuestionStatus, TopicId};
use lampstand_integration_tests::{TestBackend, api_path, ok, page, question};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn answer() -> serde_json::Value {
    json!({
        "_id": "a1",
        "answer": "Hebrews 11:1",
        "adminUser": "Priscilla",
        "dateAnswered": "2024-03-03T08:00:00Z"
    })
}

#[tokio::test]
async fn test_asking_refreshes_topic_question_list() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("/questions")))
        .and(query_param("topicId", "t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![])))
        .up_to_n_times(1)
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("/questions")))
        .and(query_param("topicId", "t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![question(
            "q1",
            "t1",
            "What is faith?",
        )])))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("/questions")))
        .and(body_json(json!({ "question": "What is faith?", "topicId": "t1" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(ok(question(
            "q1",
            "t1",
            "What is faith?",
        ))))
        .expect(1)
        .mount(&backend.server)
        .await;

    let params = QuestionListParams::for_topic(TopicId::new("t1"));
    assert!(backend.client.questions(&params).await.unwrap().is_empty());

    let input = NewQuestion {
        question: "What is faith?".to_string(),
        topic_id: TopicId::new("t1"),
        asked_by: None,
    };
    let created = backend.client.create_question(&input).await.unwrap();

    let listed = backend.client.questions(&params).await.unwrap();
    assert_eq!(listed.items.first().unwrap().id, created.id);
    backend.server.verify().await;
}

#[tokio::test]
async fn test_admin_view_derives_status_and_priority() {
    let backend = TestBackend::start().await;

    let mut answered = question("q2", "t1", "Who wrote Hebrews?");
    answered["answers"] = json!([answer()]);

    Mock::given(method("GET"))
        .and(path(api_path("/admin/questions")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![
            question("q1", "t1", "What is faith?"),
            answered,
        ])))
        .expect(1)
        .mount(&backend.server)
        .await;

    let views = backend
        .client
        .admin_questions(&AdminQuestionParams::default())
        .await
        .unwrap();

    let pending = views.items.first().unwrap();
    assert_eq!(pending.status, QuestionStatus::Pending);
    assert_eq!(pending.priority, Priority::High);

    let done = views.items.get(1).unwrap();
    assert_eq!(done.status, QuestionStatus::Answered);
    assert_eq!(done.priority, Priority::Low);
    backend.server.verify().await;
}

#[tokio::test]
async fn test_answering_refreshes_question_and_admin_views() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("/questions/q1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(question(
            "q1",
            "t1",
            "What is faith?",
        ))))
        .expect(2)
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("/admin/questions")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![question(
            "q1",
            "t1",
            "What is faith?",
        )])))
        .expect(2)
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("/admin/activity")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![])))
        .expect(2)
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("/questions/q1/answers")))
        .respond_with(ResponseTemplate::new(201).set_body_json(ok(answer())))
        .expect(1)
        .mount(&backend.server)
        .await;

    let id = QuestionId::new("q1");
    let admin_params = AdminQuestionParams::default();
    let activity_params = ActivityParams { limit: Some(5) };

    backend.client.question(&id).await.unwrap();
    backend.client.admin_questions(&admin_params).await.unwrap();
    backend.client.recent_activity(&activity_params).await.unwrap();

    let input = AnswerInput {
        answer: "Hebrews 11:1".to_string(),
    };
    let answer = backend.client.add_answer(&id, &input).await.unwrap();
    assert_eq!(answer.admin_user, "Priscilla");

    backend.client.question(&id).await.unwrap();
    backend.client.admin_questions(&admin_params).await.unwrap();
    backend.client.recent_activity(&activity_params).await.unwrap();
    backend.server.verify().await;
}
