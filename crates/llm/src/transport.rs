//! HTTP Transport
//!
//! One POST per attempt. The transport reports status, `Retry-After` and the
//! body; classifying them is left to the retry controller.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use url::Url;

use mindmate_core::TransportSettings;

use crate::envelope::GenerateContentRequest;
use crate::http_client::build_http_client;
use crate::types::{GeminiError, LlmResult};

/// Status, `Retry-After` header and body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub retry_after: Option<String>,
    pub body: String,
}

impl RawResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            retry_after: None,
            body: body.into(),
        }
    }
}

/// Sends a `generateContent` request.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` as JSON. Only connection-level failures are errors;
    /// every HTTP status comes back as a [`RawResponse`].
    async fn post_json(&self, url: &Url, body: &GenerateContentRequest) -> LlmResult<RawResponse>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(settings: &TransportSettings) -> LlmResult<Self> {
        Ok(Self {
            client: build_http_client(settings)?,
        })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn map_reqwest_error(err: reqwest::Error) -> GeminiError {
        // The request URL carries the API key.
        let err = err.without_url();
        if err.is_builder() {
            GeminiError::InvalidUrl {
                message: err.to_string(),
            }
        } else if err.is_timeout() {
            GeminiError::network(format!("request timed out: {}", err))
        } else if err.is_connect() {
            GeminiError::network(format!("cannot connect: {}", err))
        } else {
            GeminiError::network(format!("request failed: {}", err))
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(&self, url: &Url, body: &GenerateContentRequest) -> LlmResult<RawResponse> {
        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await
            .map_err(Self::map_reqwest_error)?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.text().await.map_err(Self::map_reqwest_error)?;

        tracing::debug!(status, body_len = body.len(), "gemini response received");

        Ok(RawResponse {
            status,
            retry_after,
            body,
        })
    }
}

/// URL safe to log: the `key` query parameter is replaced.
pub fn redact_url(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if k == "key" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), value)
        })
        .collect();
    if pairs.is_empty() {
        return redacted.to_string();
    }
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GenerationConfig;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> GenerateContentRequest {
        GenerateContentRequest::single_turn("hi", GenerationConfig::default())
    }

    #[test]
    fn test_redact_url() {
        let url = Url::parse("https://example.test/models/m:generateContent?key=secret").unwrap();
        let redacted = redact_url(&url);
        assert!(!redacted.contains("secret"));
        assert!(redacted.contains("key=***"));
    }

    #[tokio::test]
    async fn test_post_json_reports_status_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/m:generateContent"))
            .and(query_param("key", "k"))
            .and(header("content-type", "application/json"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("Retry-After", "3")
                    .set_body_string("{\"error\":{\"message\":\"quota\"}}"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(&TransportSettings::default()).unwrap();
        let url = Url::parse(&format!("{}/models/m:generateContent?key=k", server.uri())).unwrap();
        let raw = transport.post_json(&url, &request()).await.unwrap();

        assert_eq!(raw.status, 429);
        assert_eq!(raw.retry_after.as_deref(), Some("3"));
        assert!(raw.body.contains("quota"));
    }

    #[tokio::test]
    async fn test_connection_failure_is_network_error() {
        let transport = ReqwestTransport::new(&TransportSettings::default()).unwrap();
        // Port 9 (discard) on localhost is expected to refuse connections.
        let url = Url::parse("http://127.0.0.1:9/models/m:generateContent?key=secret").unwrap();
        let err = transport.post_json(&url, &request()).await.unwrap_err();

        assert!(matches!(err, GeminiError::NetworkError { .. }));
        assert!(!err.to_string().contains("secret"));
    }
}
