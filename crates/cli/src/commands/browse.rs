//! Topic, question and thread browsing.

use std::fmt::Write as _;

use lampstand_client::{ApiClient, QuestionListParams, TopicListParams};
use lampstand_core::{AuthorType, NewQuestion, ThreadId, ThreadNode, TopicId};

use super::{CliError, print_json, print_text};

pub async fn list_topics(
    client: &ApiClient,
    page: Option<u32>,
    limit: Option<u32>,
    search: Option<String>,
) -> Result<(), CliError> {
    let params = TopicListParams {
        page,
        limit,
        search,
        is_active: None,
    };
    let topics = client.topics(&params).await?;
    print_json(&*topics)
}

pub async fn show_topic(client: &ApiClient, id: &str) -> Result<(), CliError> {
    let topic = client.topic(&TopicId::new(id)).await?;
    print_json(&*topic)
}

pub async fn list_questions(
    client: &ApiClient,
    topic: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
) -> Result<(), CliError> {
    let params = QuestionListParams {
        page,
        limit,
        topic_id: topic.map(TopicId::new),
        search: None,
    };
    let questions = client.questions(&params).await?;
    print_json(&*questions)
}

pub async fn ask_question(client: &ApiClient, topic: &str, question: &str) -> Result<(), CliError> {
    let input = NewQuestion {
        question: question.to_string(),
        topic_id: TopicId::new(topic),
        asked_by: client.current_user().and_then(|user| user.name),
    };
    let created = client.create_question(&input).await?;
    tracing::info!(id = %created.id, "Question submitted");

    // Read back through the cache to show the stored copy.
    let stored = client.question(&created.id).await?;
    print_json(&*stored)
}

pub async fn show_thread(client: &ApiClient, id: &str) -> Result<(), CliError> {
    let thread = client.thread(&ThreadId::new(id)).await?;
    print_text(render_thread(&thread).trim_end());
    Ok(())
}

/// Indented text rendering of a reply tree, one message per line.
fn render_thread(root: &ThreadNode) -> String {
    let mut out = String::new();
    render_node(root, 0, &mut out);
    out
}

fn render_node(node: &ThreadNode, depth: usize, out: &mut String) {
    let message = &node.message;
    let badge = match message.author_type {
        AuthorType::Admin => " [admin]",
        AuthorType::User => "",
    };
    let content = if message.is_hidden {
        "(hidden)"
    } else {
        message.content.as_str()
    };
    let edited = if message.is_edited { " (edited)" } else { "" };

    let _ = writeln!(
        out,
        "{indent}{author}{badge} {date}: {content}{edited}",
        indent = "  ".repeat(depth),
        author = message.author,
        date = message.date_created.format("%Y-%m-%d %H:%M"),
    );

    for reply in &node.replies {
        render_node(reply, depth + 1, out);
    }
}
