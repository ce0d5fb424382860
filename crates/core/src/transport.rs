//! Transport Settings
//!
//! Connection-level settings for outbound HTTP: per-attempt timeout,
//! connect timeout and an optional proxy. The client factory that consumes
//! them lives in the `mindmate-llm` crate.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Default per-attempt request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Proxy protocol type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks5,
}

impl ProxyProtocol {
    pub fn scheme(&self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
            ProxyProtocol::Socks5 => "socks5",
        }
    }
}

/// Outbound proxy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyConfig {
    pub protocol: ProxyProtocol,
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Never written back to disk.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Proxy URL without credentials.
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol.scheme(), self.host, self.port)
    }
}

/// Settings for the HTTP transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransportSettings {
    /// Timeout applied to every attempt, independent of the retry budget.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// How long to wait for a connection before the attempt counts as a
    /// network failure.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            proxy: None,
        }
    }
}

impl TransportSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.request_timeout_secs == 0 {
            return Err(CoreError::validation("request_timeout_secs must be positive"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(CoreError::validation("connect_timeout_secs must be positive"));
        }
        if self.connect_timeout_secs > self.request_timeout_secs {
            return Err(CoreError::validation(
                "connect_timeout_secs cannot exceed request_timeout_secs",
            ));
        }
        if let Some(proxy) = &self.proxy {
            if proxy.host.trim().is_empty() {
                return Err(CoreError::validation("proxy host is empty"));
            }
        }
        Ok(())
    }
}
