//! gnvi-discovery: Session state, client acquisition and the discovery
//! request handler. Everything the page needs except the page itself.

pub mod client;
pub mod discovery;
pub mod prompt;
pub mod session;
pub mod submission;
pub mod topic;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{Acquired, ClientCell, ClientFactory, GeminiClientFactory, CANNOT_RUN};
pub use discovery::{run_neural_discovery, Discovered, DiscoveryError, DiscoveryResult};
pub use session::{Session, SessionStore, READY_ENTRY};
pub use submission::{submit, Submission, KEEP_LOG_ENTRIES};
pub use topic::{Topic, TopicError, MAX_TOPIC_CHARS};
