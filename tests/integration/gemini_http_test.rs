//! Gemini Client HTTP Integration Tests
//!
//! Drives `GeminiClient` over reqwest against a wiremock server.

use std::time::{Duration, Instant};

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mindmate_core::ChatTurn;
use mindmate_llm::{GeminiClient, GeminiConfig, GeminiError, RetryPolicy};

const MODEL_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        backoff_base: Duration::from_millis(1),
        default_rate_limit_delay: Duration::from_millis(1),
    }
}

fn client_for(server: &MockServer) -> GeminiClient {
    let config = GeminiConfig::new("test-key")
        .with_base_url(format!("{}/v1beta/models", server.uri()))
        .with_retry(fast_retry());
    GeminiClient::new(config).unwrap()
}

fn envelope(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    })
}

// ============================================================================
// Success Path
// ============================================================================

#[tokio::test]
async fn test_send_message_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(query_param("key", "test-key"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Be kind.\nI can't sleep" }] }],
            "generationConfig": { "topK": 40, "maxOutputTokens": 1024 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope("Let's talk about it.")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .send_message(&[ChatTurn::user("I can't sleep")], "Be kind.")
        .await
        .unwrap();

    assert_eq!(reply, "Let's talk about it.");
}

#[tokio::test]
async fn test_analyze_emotions_with_fenced_json() {
    let server = MockServer::start().await;
    let fenced = "```json\n{\"emotions\":{\"happiness\":0.2,\"anxiety\":0.8}}\n```";
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(fenced)))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .analyze_emotions(&["Exams tomorrow".to_string()])
        .await
        .unwrap();

    assert_eq!(result.dominant_label(), "anxiety");
    assert_eq!(result.scores().get("happiness"), Some(0.2));
}

// ============================================================================
// Status Classification
// ============================================================================

#[tokio::test]
async fn test_unauthorized_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "error": { "code": 401, "message": "API key not valid" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).send_message(&[], "sys").await.unwrap_err();

    assert_eq!(
        err,
        GeminiError::Unauthorized {
            message: "API key not valid".to_string()
        }
    );
}

#[tokio::test]
async fn test_rate_limit_honours_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0.2"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope("after the wait")))
        .expect(1)
        .mount(&server)
        .await;

    let start = Instant::now();
    let reply = client_for(&server).send_message(&[], "sys").await.unwrap();

    assert_eq!(reply, "after the wait");
    assert!(start.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_rate_limit_without_retry_after_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).send_message(&[], "sys").await.unwrap_err();
    assert!(matches!(err, GeminiError::RateLimited { retry_after: None, .. }));
}

#[tokio::test]
async fn test_server_errors_exhaust_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({ "error": { "message": "overloaded" } })),
        )
        .expect(3)
        .mount(&server)
        .await;

    let err = client_for(&server).send_message(&[], "sys").await.unwrap_err();

    match &err {
        GeminiError::MaxRetriesExceeded { attempts, .. } => assert_eq!(*attempts, 3),
        other => panic!("expected MaxRetriesExceeded, got {other:?}"),
    }
    assert_eq!(
        err.root_cause(),
        &GeminiError::ServerError {
            status: 503,
            message: "overloaded".to_string()
        }
    );
}

#[tokio::test]
async fn test_non_json_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy page</html>"))
        .expect(3)
        .mount(&server)
        .await;

    let err = client_for(&server).send_message(&[], "sys").await.unwrap_err();
    assert!(matches!(
        err.root_cause(),
        GeminiError::InvalidResponse { .. }
    ));
}

// ============================================================================
// Transport Failures
// ============================================================================

#[tokio::test]
async fn test_connection_refused_exhausts_retries() {
    let config = GeminiConfig::new("secret-key")
        .with_base_url("http://127.0.0.1:9/v1beta/models")
        .with_retry(fast_retry());
    let client = GeminiClient::new(config).unwrap();

    let err = client.send_message(&[], "sys").await.unwrap_err();

    assert!(matches!(err, GeminiError::MaxRetriesExceeded { attempts: 3, .. }));
    assert!(matches!(err.root_cause(), GeminiError::NetworkError { .. }));
    assert!(!err.to_string().contains("secret-key"));
}

#[tokio::test]
async fn test_missing_key_rejected_at_construction() {
    let err = GeminiClient::new(GeminiConfig::new("")).unwrap_err();
    assert_eq!(err, GeminiError::MissingApiKey);
}
