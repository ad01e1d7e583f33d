//! Client acquisition: at most one backend handle per session.

use std::sync::{Arc, OnceLock};

use gnvi_llm::gemini::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use gnvi_llm::{GeminiBackend, LlmBackend, LlmError};
use secrecy::SecretString;

/// Shown when a discovery is attempted without a usable client.
pub const CANNOT_RUN: &str = "Cannot run. The Gemini Client failed to initialize.";

pub fn fatal_message(detail: &str) -> String {
    format!("FATAL: Error initializing Gemini client. Please check your API key. Error: {detail}")
}

/// Builds backend handles from a secret key.
pub trait ClientFactory: Send + Sync {
    fn connect(&self, api_key: &SecretString) -> Result<Arc<dyn LlmBackend>, LlmError>;
}

#[derive(Debug, Clone)]
pub struct GeminiClientFactory {
    pub model: String,
    pub base_url: String,
}

impl GeminiClientFactory {
    pub fn new(model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self { model: model.into(), base_url: base_url.into() }
    }
}

impl Default for GeminiClientFactory {
    fn default() -> Self {
        Self::new(DEFAULT_GEMINI_MODEL, DEFAULT_GEMINI_BASE_URL)
    }
}

impl ClientFactory for GeminiClientFactory {
    fn connect(&self, api_key: &SecretString) -> Result<Arc<dyn LlmBackend>, LlmError> {
        let backend = GeminiBackend::with_base_url(api_key, &self.model, &self.base_url)?;
        Ok(Arc::new(backend))
    }
}

/// Result of [`ClientCell::get_client`].
pub struct Acquired {
    pub client: Option<Arc<dyn LlmBackend>>,
    /// Set only by the call that performed the failed construction.
    pub fatal: Option<String>,
}

/// Lazy, write-once slot for a session's client. A failed construction is
/// remembered too, so a bad key is reported once and never retried.
#[derive(Default)]
pub struct ClientCell {
    slot: OnceLock<Result<Arc<dyn LlmBackend>, String>>,
}

impl ClientCell {
    pub fn get_client(&self, factory: &dyn ClientFactory, api_key: &SecretString) -> Acquired {
        let mut constructed_now = false;
        let slot = self.slot.get_or_init(|| {
            constructed_now = true;
            match factory.connect(api_key) {
                Ok(client) => {
                    tracing::info!(model = client.model_id(), "Gemini client initialised");
                    Ok(client)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Gemini client initialisation failed");
                    Err(e.to_string())
                }
            }
        });

        match slot {
            Ok(client) => Acquired { client: Some(Arc::clone(client)), fatal: None },
            Err(detail) => Acquired {
                client: None,
                fatal: constructed_now.then(|| fatal_message(detail)),
            },
        }
    }
}
