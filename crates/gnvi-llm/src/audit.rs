//! Audit record for remote generation calls.
//! One entry per call; emitted through `tracing`, never containing the
//! prompt or the key, only a SHA-256 of the output.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmAuditEntry {
    pub id: Uuid,
    pub session_id: Option<String>,
    pub model: String,
    pub success: bool,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub grounding_sources: usize,
    pub output_hash: String,
    pub latency_ms: u64,
    pub called_at: chrono::DateTime<Utc>,
}

impl LlmAuditEntry {
    pub fn new(session_id: Option<String>, model: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            model: model.into(),
            success: false,
            prompt_tokens: 0,
            completion_tokens: 0,
            grounding_sources: 0,
            output_hash: String::new(),
            latency_ms,
            called_at: Utc::now(),
        }
    }

    pub fn with_response(mut self, resp: &crate::LlmResponse) -> Self {
        self.success = true;
        self.prompt_tokens = resp.prompt_tokens;
        self.completion_tokens = resp.completion_tokens;
        self.grounding_sources = resp.grounding.sources.len();
        self.output_hash = hash_output(&resp.content);
        self
    }

    pub fn emit(&self) {
        tracing::info!(
            audit_id = %self.id,
            session_id = self.session_id.as_deref().unwrap_or("-"),
            model = %self.model,
            success = self.success,
            prompt_tokens = self.prompt_tokens,
            completion_tokens = self.completion_tokens,
            grounding_sources = self.grounding_sources,
            output_hash = %self.output_hash,
            latency_ms = self.latency_ms,
            "LLM call audited"
        );
    }
}

pub fn hash_output(output: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(output.as_bytes());
    format!("{:x}", hasher.finalize())
}
