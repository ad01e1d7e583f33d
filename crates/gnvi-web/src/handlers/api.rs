//! JSON endpoints.

use axum::{extract::State, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use uuid::Uuid;

use crate::sessions::session_id;
use crate::state::SharedState;

#[derive(Serialize)]
pub struct LogResponse {
    pub session_id: Option<Uuid>,
    /// Most recent first.
    pub entries: Vec<String>,
}

/// The caller's activity log. Never creates a session.
pub async fn api_log(State(state): State<SharedState>, jar: CookieJar) -> Json<LogResponse> {
    let Some(id) = session_id(&jar) else {
        return Json(LogResponse { session_id: None, entries: Vec::new() });
    };
    let Some(session) = state.sessions.get(id).await else {
        return Json(LogResponse { session_id: None, entries: Vec::new() });
    };

    let session = session.lock().await;
    let entries = session.store.read_all_reversed().into_iter().map(str::to_string).collect();
    Json(LogResponse { session_id: Some(id), entries })
}

pub async fn healthz() -> &'static str {
    "ok"
}
