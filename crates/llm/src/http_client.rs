//! HTTP Client Factory
//!
//! Builds the reqwest client used by the Gemini transport from
//! [`TransportSettings`].

use mindmate_core::TransportSettings;

use crate::types::{GeminiError, LlmResult};

/// Build a `reqwest::Client` with timeouts and the configured proxy.
///
/// - `Some(proxy)` -> route all traffic through it
/// - `None` -> explicitly disable proxy (`no_proxy`), ignoring env vars
pub fn build_http_client(settings: &TransportSettings) -> LlmResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(settings.request_timeout())
        .connect_timeout(settings.connect_timeout());

    match &settings.proxy {
        Some(cfg) => {
            let url = cfg.url();
            let mut proxy = reqwest::Proxy::all(&url).map_err(|e| GeminiError::InvalidUrl {
                message: format!("proxy {}: {}", url, e),
            })?;
            if let (Some(user), Some(password)) = (&cfg.username, &cfg.password) {
                proxy = proxy.basic_auth(user, password);
            }
            builder = builder.proxy(proxy);
        }
        None => {
            builder = builder.no_proxy();
        }
    }

    builder
        .build()
        .map_err(|e| GeminiError::network(format!("failed to build HTTP client: {}", e)))
}
