//! Shared building blocks for the Jarvis issue-drafting assistant.
//!
//! Holds the domain types passed between the chat engine and its
//! collaborators, the top-level error type, and the TOML configuration.

pub mod config;
pub mod error;
pub mod types;

pub use config::JarvisConfig;
pub use error::{JarvisError, Result};
pub use types::*;
