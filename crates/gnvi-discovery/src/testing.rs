//! Test doubles for the backend and the client factory.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gnvi_llm::{GroundingMetadata, LlmBackend, LlmError, LlmRequest, LlmResponse};
use secrecy::SecretString;

use crate::client::ClientFactory;

/// Records every request and answers with a canned reply or error.
pub struct StubBackend {
    reply: Result<String, String>,
    grounding: GroundingMetadata,
    requests: Mutex<Vec<LlmRequest>>,
}

impl StubBackend {
    pub fn replying(text: impl Into<String>) -> Self {
        Self { reply: Ok(text.into()), grounding: GroundingMetadata::default(), requests: Mutex::default() }
    }

    /// Fails every call with a 503 whose message is `detail`.
    pub fn failing(detail: impl Into<String>) -> Self {
        Self { reply: Err(detail.into()), grounding: GroundingMetadata::default(), requests: Mutex::default() }
    }

    pub fn with_grounding(mut self, grounding: GroundingMetadata) -> Self {
        self.grounding = grounding;
        self
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.requests().len()
    }
}

#[async_trait]
impl LlmBackend for StubBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(req);
        }
        match &self.reply {
            Ok(text) => Ok(LlmResponse {
                content: text.clone(),
                model: self.model_id().to_string(),
                prompt_tokens: 10,
                completion_tokens: 20,
                grounding: self.grounding.clone(),
            }),
            Err(detail) => Err(LlmError::ApiError { status: 503, message: detail.clone() }),
        }
    }

    fn model_id(&self) -> &str { "stub-model" }
}

/// Hands out one shared [`StubBackend`] and counts constructions.
pub struct StubFactory {
    backend: Arc<StubBackend>,
    connects: AtomicUsize,
}

impl StubFactory {
    pub fn new(backend: StubBackend) -> Self {
        Self { backend: Arc::new(backend), connects: AtomicUsize::new(0) }
    }

    pub fn backend(&self) -> Arc<StubBackend> {
        Arc::clone(&self.backend)
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl ClientFactory for StubFactory {
    fn connect(&self, _api_key: &SecretString) -> Result<Arc<dyn LlmBackend>, LlmError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let backend: Arc<dyn LlmBackend> = self.backend.clone();
        Ok(backend)
    }
}

/// Always fails construction, as a malformed key would.
#[derive(Default)]
pub struct FailingFactory {
    connects: AtomicUsize,
}

impl FailingFactory {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl ClientFactory for FailingFactory {
    fn connect(&self, _api_key: &SecretString) -> Result<Arc<dyn LlmBackend>, LlmError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Err(LlmError::InvalidApiKey("malformed key".to_string()))
    }
}
