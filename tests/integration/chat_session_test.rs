//! Chat Session Integration Tests
//!
//! A `ChatSession` over the real client: the reply and the per-message tag are
//! separate requests to the same endpoint, told apart by prompt content.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mindmate::{find_role, ChatSession};
use mindmate_llm::{GeminiApi, GeminiClient, GeminiConfig, RetryPolicy};

fn envelope(text: &str) -> serde_json::Value {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
}

fn api_for(server: &MockServer) -> Arc<dyn GeminiApi> {
    let config = GeminiConfig::new("k")
        .with_base_url(server.uri())
        .with_retry(RetryPolicy {
            max_retries: 2,
            backoff_base: Duration::from_millis(1),
            default_rate_limit_delay: Duration::from_millis(1),
        });
    Arc::new(GeminiClient::new(config).unwrap())
}

#[tokio::test]
async fn test_reply_and_tag() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("User messages:"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            r#"{"emotions":{"sadness":0.8,"calmness":0.1},"dominant_emotion":"sadness"}"#,
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope("I'm here for you.")))
        .mount(&server)
        .await;

    let mut session = ChatSession::new(api_for(&server), find_role("therapist").unwrap());
    let outcome = session.send("I lost my cat today").await.unwrap();

    assert_eq!(outcome.reply_turn.text(), "I'm here for you.");
    assert!(!outcome.reply_failed);
    assert_eq!(outcome.tag.unwrap().dominant_label(), "sadness");
    assert_eq!(session.turns().len(), 2);
}

#[tokio::test]
async fn test_tag_failure_still_delivers_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("User messages:"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope("no idea, sorry")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope("Tell me more.")))
        .mount(&server)
        .await;

    let mut session = ChatSession::new(api_for(&server), find_role("friend").unwrap());
    let outcome = session.send("Guess what happened").await.unwrap();

    assert_eq!(outcome.reply_turn.text(), "Tell me more.");
    assert!(outcome.tag.is_none());
}

#[tokio::test]
async fn test_reply_failure_becomes_error_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("User messages:"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            r#"{"emotions":{"anger":0.9}}"#,
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "API key not valid" }
        })))
        .mount(&server)
        .await;

    let mut session = ChatSession::new(api_for(&server), find_role("motivator").unwrap());
    let outcome = session.send("Nothing works!").await.unwrap();

    assert!(outcome.reply_failed);
    assert!(outcome.reply_turn.text().contains("API key not valid"));
    assert!(session.is_error_turn(outcome.reply_turn.id()));
    assert_eq!(outcome.tag.unwrap().dominant_label(), "anger");
}
