//! Shared application state for the web server.

use std::sync::Arc;

use gnvi_common::Config;
use gnvi_discovery::{ClientFactory, GeminiClientFactory};
use secrecy::{ExposeSecret, SecretString};

use crate::sessions::SessionRegistry;

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub sessions: SessionRegistry,
    pub factory: Arc<dyn ClientFactory>,
    api_key: SecretString,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        let factory = GeminiClientFactory::new(&config.gemini.model, &config.gemini.base_url);
        Self::new(
            &config.gemini.api_key,
            Arc::new(factory),
            std::time::Duration::from_secs(config.server.session_idle_secs),
        )
    }

    pub fn new(api_key: &SecretString, factory: Arc<dyn ClientFactory>, session_idle: std::time::Duration) -> Self {
        Self {
            sessions: SessionRegistry::new(session_idle),
            factory,
            api_key: SecretString::from(api_key.expose_secret().to_owned()),
        }
    }

    /// The key every new session is started with.
    pub fn session_key(&self) -> SecretString {
        SecretString::from(self.api_key.expose_secret().to_owned())
    }
}

pub type SharedState = Arc<AppState>;
