//! Data Models
//!
//! Contains the configuration and role data structures used by the application.

pub mod role;
pub mod settings;

pub use role::*;
pub use settings::*;
