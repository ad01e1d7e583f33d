//! gnvi-llm: Hosted generation backend abstraction.
//! Implements the LlmBackend trait, the Gemini REST backend with
//! search grounding, and the per-call audit record.

pub mod audit;
pub mod backend;
pub mod gemini;

pub use backend::{
    GroundingMetadata, GroundingSource, LlmBackend, LlmError, LlmRequest, LlmResponse, Message,
    Role, Tool,
};
pub use gemini::GeminiBackend;
