//! Per-session state: the API key and the append-only activity log.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use uuid::Uuid;

use crate::client::{ClientCell, ClientFactory};

/// First entry of every fresh log.
pub const READY_ENTRY: &str = "System Ready: Gemini Client Initialized.";

/// The API key and activity log for one session.
///
/// The key is fixed at construction. Log entries are never edited or
/// reordered once appended; the only removal is [`truncate_to_last`](Self::truncate_to_last).
#[derive(Debug)]
pub struct SessionStore {
    id: Uuid,
    api_key: SecretString,
    log: Option<Vec<String>>,
}

impl SessionStore {
    pub fn new(id: Uuid, api_key: SecretString) -> Self {
        Self { id, api_key, log: None }
    }

    pub fn id(&self) -> Uuid { self.id }

    pub fn api_key(&self) -> &SecretString { &self.api_key }

    /// Create the log with [`READY_ENTRY`] unless it already exists.
    pub fn initialize(&mut self) {
        if self.log.is_none() {
            self.log = Some(vec![READY_ENTRY.to_string()]);
        }
    }

    pub fn append(&mut self, entry: impl Into<String>) {
        self.log.get_or_insert_with(Vec::new).push(entry.into());
    }

    /// Keep only the last `n` entries, in their original order.
    pub fn truncate_to_last(&mut self, n: usize) {
        if let Some(log) = self.log.as_mut() {
            let excess = log.len().saturating_sub(n);
            log.drain(..excess);
        }
    }

    /// Most recent entry first.
    pub fn read_all_reversed(&self) -> Vec<&str> {
        self.entries().iter().rev().map(String::as_str).collect()
    }

    /// Insertion order.
    pub fn entries(&self) -> &[String] {
        self.log.as_deref().unwrap_or(&[])
    }

    pub fn len(&self) -> usize { self.entries().len() }

    pub fn is_empty(&self) -> bool { self.entries().is_empty() }

    pub fn last(&self) -> Option<&str> {
        self.entries().last().map(String::as_str)
    }
}

/// Everything owned by one user session: the store, its memoized client
/// handle, and the bookkeeping the registry uses for idle expiry.
pub struct Session {
    pub store: SessionStore,
    pub client: ClientCell,
    pub last_seen: DateTime<Utc>,
}

impl Session {
    pub fn new(id: Uuid, api_key: SecretString) -> Self {
        Self {
            store: SessionStore::new(id, api_key),
            client: ClientCell::default(),
            last_seen: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid { self.store.id() }

    pub fn touch(&mut self) {
        self.last_seen = Utc::now();
    }

    /// Page-load step: initialise the log and acquire the client.
    /// Returns the fatal banner text only on the load that first saw the
    /// construction fail.
    pub fn on_page_load(&mut self, factory: &dyn ClientFactory) -> Option<String> {
        self.touch();
        self.store.initialize();
        self.client.get_client(factory, self.store.api_key()).fatal
    }
}
