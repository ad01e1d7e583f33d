//! Configuration loading for GNVI.
//! Reads gnvi.toml from the current directory or the path in GNVI_CONFIG.
//! A missing file is not an error: every field has a default, and the Gemini
//! API key falls back to GNVI_GEMINI_API_KEY / GEMINI_API_KEY.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;

use crate::error::{GnviError, Result};

/// Environment variables consulted, in order, when `gemini.api_key` is empty.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GNVI_GEMINI_API_KEY", "GEMINI_API_KEY"];

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Sessions untouched for longer than this are discarded on the next registry access.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

fn default_host()              -> String { "127.0.0.1".to_string() }
fn default_port()              -> u16    { 8501 }
fn default_session_idle_secs() -> u64    { 3600 }

#[derive(Debug, Deserialize)]
#[serde(from = "RawGeminiConfig")]
pub struct GeminiConfig {
    pub api_key: SecretString,
    pub model: String,
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        RawGeminiConfig::default().into()
    }
}

/// On-disk shape of `[gemini]`; the key is moved into a `SecretString` immediately.
#[derive(Deserialize)]
struct RawGeminiConfig {
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default = "default_model")]
    model: String,
    #[serde(default = "default_base_url")]
    base_url: String,
}

impl Default for RawGeminiConfig {
    fn default() -> Self {
        Self { api_key: None, model: default_model(), base_url: default_base_url() }
    }
}

impl From<RawGeminiConfig> for GeminiConfig {
    fn from(raw: RawGeminiConfig) -> Self {
        Self {
            api_key: SecretString::from(raw.api_key.unwrap_or_default()),
            model: raw.model,
            base_url: raw.base_url,
        }
    }
}

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

fn default_model()    -> String { DEFAULT_GEMINI_MODEL.to_string() }
fn default_base_url() -> String { DEFAULT_GEMINI_BASE_URL.to_string() }

impl Config {
    /// Load configuration from gnvi.toml.
    /// Checks GNVI_CONFIG env var first, then current directory.
    pub fn load() -> Result<Self> {
        let path = std::env::var("GNVI_CONFIG")
            .unwrap_or_else(|_| "gnvi.toml".to_string());

        let mut config = if Path::new(&path).exists() {
            Self::load_from(&path)?
        } else {
            tracing::info!(path = %path, "No config file found, using defaults");
            Self::default()
        };

        config.resolve_api_key(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| GnviError::ConfigParse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Fill an empty `gemini.api_key` from the first non-empty variable in [`API_KEY_ENV_VARS`].
    pub fn resolve_api_key<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if !self.gemini.api_key.expose_secret().trim().is_empty() {
            return;
        }
        let found = API_KEY_ENV_VARS
            .iter()
            .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()));
        match found {
            Some(key) => self.gemini.api_key = SecretString::from(key),
            None => tracing::warn!(
                "No Gemini API key configured (set gemini.api_key or GNVI_GEMINI_API_KEY)"
            ),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.session_idle_secs == 0 {
            return Err(GnviError::Config(
                "server.session_idle_secs must be greater than zero".to_string(),
            ));
        }
        if self.gemini.model.trim().is_empty() {
            return Err(GnviError::Config("gemini.model must not be empty".to_string()));
        }
        if !self.gemini.base_url.starts_with("http://") && !self.gemini.base_url.starts_with("https://") {
            return Err(GnviError::Config(format!(
                "gemini.base_url must be an http(s) URL, got '{}'",
                self.gemini.base_url
            )));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests;
