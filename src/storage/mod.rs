//! Storage Layer
//!
//! Handles persistence of the JSON config and API key resolution.

pub mod config;
pub mod credentials;

pub use config::*;
pub use credentials::*;
