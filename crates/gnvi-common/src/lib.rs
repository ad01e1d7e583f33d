//! gnvi-common: Shared error type and configuration used across all GNVI crates.

pub mod config;
pub mod error;

pub use config::{Config, GeminiConfig, ServerConfig, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
pub use error::{GnviError, Result};
