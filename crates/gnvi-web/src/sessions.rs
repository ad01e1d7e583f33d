//! Cookie-keyed session registry.
//!
//! Each session sits behind its own async mutex, held for a whole request,
//! so one browser's interactions run strictly one after another while
//! separate sessions never wait on each other.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use gnvi_discovery::Session;
use secrecy::SecretString;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "gnvi_session";

pub type SharedSession = Arc<Mutex<Session>>;

pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, SharedSession>>,
    idle: Duration,
}

impl SessionRegistry {
    pub fn new(idle: Duration) -> Self {
        Self { sessions: RwLock::new(HashMap::new()), idle }
    }

    /// Look up the session for `id`, or start a new one with `api_key`.
    ///
    /// A found session is touched while the registry read lock is held, so
    /// pruning (which needs the write lock) cannot evict it before the caller
    /// locks it. A session already locked is busy and is never pruned.
    pub async fn resolve(&self, id: Option<Uuid>, api_key: impl FnOnce() -> SecretString) -> (Uuid, SharedSession) {
        self.prune_idle().await;

        if let Some(id) = id {
            let sessions = self.sessions.read().await;
            if let Some(existing) = sessions.get(&id) {
                if let Ok(mut session) = existing.try_lock() {
                    session.touch();
                }
                return (id, Arc::clone(existing));
            }
        }

        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(Session::new(id, api_key())));
        self.sessions.write().await.insert(id, Arc::clone(&session));
        tracing::info!(session_id = %id, "Session started");
        (id, session)
    }

    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Discard a session. Returns whether it existed.
    pub async fn end(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            tracing::info!(session_id = %id, "Session ended");
        }
        removed
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    #[cfg(test)]
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop sessions idle past the limit. Sessions busy with a request are kept.
    async fn prune_idle(&self) {
        let Ok(idle) = chrono::Duration::from_std(self.idle) else { return };
        let cutoff = Utc::now() - idle;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(s) => s.last_seen >= cutoff,
            Err(_) => true,
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            tracing::info!(pruned, "Idle sessions discarded");
        }
    }
}

pub fn session_id(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
}

pub fn session_cookie(id: Uuid) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SecretString {
        SecretString::from("AIza-test".to_string())
    }

    #[tokio::test]
    async fn test_resolve_reuses_known_id() {
        let reg = SessionRegistry::new(Duration::from_secs(60));
        let (id, first) = reg.resolve(None, key).await;
        let (same, second) = reg.resolve(Some(id), key).await;
        assert_eq!(id, same);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(reg.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_id_gets_fresh_session() {
        let reg = SessionRegistry::new(Duration::from_secs(60));
        let stale = Uuid::new_v4();
        let (id, _) = reg.resolve(Some(stale), key).await;
        assert_ne!(id, stale);
    }

    #[tokio::test]
    async fn test_end_removes_session() {
        let reg = SessionRegistry::new(Duration::from_secs(60));
        let (id, _) = reg.resolve(None, key).await;
        assert!(reg.end(id).await);
        assert!(!reg.end(id).await);
        assert!(reg.is_empty().await);
    }

    #[tokio::test]
    async fn test_idle_sessions_pruned() {
        let reg = SessionRegistry::new(Duration::from_secs(60));
        let (old_id, old) = reg.resolve(None, key).await;
        old.lock().await.last_seen = Utc::now() - chrono::Duration::seconds(120);

        let (new_id, _) = reg.resolve(None, key).await;

        assert!(reg.get(old_id).await.is_none());
        assert!(reg.get(new_id).await.is_some());
    }

    #[tokio::test]
    async fn test_resolved_session_survives_next_prune() {
        let reg = SessionRegistry::new(Duration::from_secs(60));
        let (id, session) = reg.resolve(None, key).await;
        let stale = Utc::now() - chrono::Duration::seconds(59);
        session.lock().await.last_seen = stale;

        // Hand out the session without locking it, then let another request prune.
        let (same, resolved) = reg.resolve(Some(id), key).await;
        assert_eq!(same, id);
        assert!(resolved.lock().await.last_seen > stale + chrono::Duration::seconds(30));

        let (other, _) = reg.resolve(None, key).await;
        assert_ne!(other, id);
        assert!(reg.get(id).await.is_some());
    }

    #[test]
    fn test_cookie_round_trip() {
        let id = Uuid::new_v4();
        let jar = CookieJar::new().add(session_cookie(id));
        assert_eq!(session_id(&jar), Some(id));
    }
}
