//! Integration Tests Module
//!
//! End-to-end tests over HTTP mocks: the Gemini client pipeline, chat sessions
//! with concurrent tagging, and configuration loading.

// Gemini client against a mock HTTP server
mod gemini_http_test;

// Chat session over the real client
mod chat_session_test;

// Config file, key resolution and client configuration
mod config_test;
