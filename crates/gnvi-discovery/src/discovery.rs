//! The discovery request: one topic in, one grounded generation call out.
//!
//! Two log entries are appended before the call and exactly one after it.
//! The model's text is handed back untouched; nothing checks that it really
//! holds 20 rows or valid HTTPS links. Failures never escape as panics or
//! unhandled errors: they come back as a [`DiscoveryError`] whose `Display`
//! is the user-facing message.

use std::time::Instant;

use gnvi_llm::audit::LlmAuditEntry;
use gnvi_llm::{GroundingMetadata, LlmBackend, LlmError};
use thiserror::Error;

use crate::prompt::build_request;
use crate::session::SessionStore;
use crate::topic::Topic;

/// Characters of the topic echoed into the log.
pub const PREVIEW_CHARS: usize = 40;

pub const STARTING_ENTRY: &str = "-> 🧠 Initiating GNVI Neural Vectoring Indexing (Gemini API Call)";
pub const COMPLETE_ENTRY: &str = "-> ✅ Indexing Complete. 20 URL Relationships Deciphered.";

#[derive(Debug, Error)]
#[error("An error occurred during the massive search and indexing process: {source}")]
pub struct DiscoveryError {
    #[from]
    pub source: LlmError,
}

impl DiscoveryError {
    /// The underlying failure text, as written to the log.
    pub fn detail(&self) -> String {
        self.source.to_string()
    }
}

/// A successful discovery.
#[derive(Debug, Clone)]
pub struct Discovered {
    /// The model's text payload, unmodified.
    pub markdown: String,
    pub grounding: GroundingMetadata,
}

pub type DiscoveryResult = Result<Discovered, DiscoveryError>;

/// The "always a string" view of a result: the markdown, or the error message.
pub fn display_text(result: &DiscoveryResult) -> String {
    match result {
        Ok(found) => found.markdown.clone(),
        Err(e) => e.to_string(),
    }
}

pub fn input_entry(topic: &Topic) -> String {
    format!("-> 🔍 Input Summary Received: '{}...'", topic.preview(PREVIEW_CHARS))
}

pub fn error_entry(detail: &str) -> String {
    format!("-> ❌ API Error: {detail}")
}

pub async fn run_neural_discovery(
    client: &dyn LlmBackend,
    store: &mut SessionStore,
    topic: &Topic,
) -> DiscoveryResult {
    let request = build_request(topic.as_str(), client.model_id());

    store.append(input_entry(topic));
    store.append(STARTING_ENTRY);

    let started = Instant::now();
    let outcome = client.complete(request).await;
    let latency_ms = started.elapsed().as_millis() as u64;
    let audit = LlmAuditEntry::new(Some(store.id().to_string()), client.model_id(), latency_ms);

    match outcome {
        Ok(resp) => {
            audit.with_response(&resp).emit();
            store.append(COMPLETE_ENTRY);
            Ok(Discovered {
                markdown: resp.content,
                grounding: resp.grounding,
            })
        }
        Err(e) => {
            audit.emit();
            tracing::warn!(session_id = %store.id(), error = %e, "Discovery request failed");
            store.append(error_entry(&e.to_string()));
            Err(DiscoveryError::from(e))
        }
    }
}
