//! The submit action of the page, independent of how the page is drawn.

use crate::client::{ClientFactory, CANNOT_RUN};
use crate::discovery::{run_neural_discovery, DiscoveryResult};
use crate::session::Session;
use crate::topic::{Topic, TopicError};

/// Log entries kept from earlier runs when a new discovery starts.
pub const KEEP_LOG_ENTRIES: usize = 3;

/// What a submit produced.
pub enum Submission {
    /// No usable client; nothing was sent. `fatal` is set if this submit is
    /// the one that discovered the construction failure.
    CannotRun { fatal: Option<String> },
    /// Input rejected before reaching the handler.
    Rejected(TopicError),
    /// One remote call was made.
    Completed { topic: Topic, result: DiscoveryResult },
}

impl Submission {
    /// Message for the non-result outcomes.
    pub fn notice(&self) -> Option<String> {
        match self {
            Submission::CannotRun { .. } => Some(CANNOT_RUN.to_string()),
            Submission::Rejected(e) => Some(e.to_string()),
            Submission::Completed { .. } => None,
        }
    }
}

/// Guard on the client, validate, reset the log to its tail, then run.
pub async fn submit(session: &mut Session, factory: &dyn ClientFactory, raw_input: &str) -> Submission {
    session.touch();
    session.store.initialize();

    let acquired = session.client.get_client(factory, session.store.api_key());
    let Some(client) = acquired.client else {
        tracing::warn!(session_id = %session.id(), "Submit refused: no Gemini client");
        return Submission::CannotRun { fatal: acquired.fatal };
    };

    let topic = match Topic::parse(raw_input) {
        Ok(topic) => topic,
        Err(e) => {
            tracing::debug!(session_id = %session.id(), reason = %e, "Topic rejected");
            return Submission::Rejected(e);
        }
    };

    session.store.truncate_to_last(KEEP_LOG_ENTRIES);
    let result = run_neural_discovery(client.as_ref(), &mut session.store, &topic).await;
    Submission::Completed { topic, result }
}
