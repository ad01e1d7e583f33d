//! Discovery page: topic in, 20-URL markdown table out.

use axum::{extract::State, response::{Html, Redirect}, Form};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use gnvi_discovery::{discovery::display_text, submit, Submission};
use serde::Deserialize;

use crate::render::{render_page, Outcome, PageView};
use crate::sessions::{session_cookie, session_id, SESSION_COOKIE};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct DiscoverForm {
    #[serde(default)]
    pub topic: String,
}

pub async fn discover_page(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> (CookieJar, Html<String>) {
    let (id, session) = state.sessions.resolve(session_id(&jar), || state.session_key()).await;
    let mut session = session.lock().await;

    let fatal = session.on_page_load(state.factory.as_ref());

    let html = render_page(&PageView {
        fatal: fatal.as_deref(),
        log: session.store.read_all_reversed(),
        topic: "",
        outcome: Outcome::None,
    });
    (jar.add(session_cookie(id)), Html(html))
}

pub async fn discover_submit(
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<DiscoverForm>,
) -> (CookieJar, Html<String>) {
    // Browsers submit textarea line breaks as CRLF but count them as one
    // character against `maxlength`.
    let topic = form.topic.replace("\r\n", "\n");

    let (id, session) = state.sessions.resolve(session_id(&jar), || state.session_key()).await;
    let mut session = session.lock().await;

    let submission = submit(&mut session, state.factory.as_ref(), &topic).await;
    let notice = submission.notice();

    let result_text;
    let (fatal, outcome) = match &submission {
        Submission::CannotRun { fatal } => (fatal.as_deref(), Outcome::Error(notice.unwrap_or_default())),
        Submission::Rejected(_) => (None, Outcome::Warning(notice.unwrap_or_default())),
        Submission::Completed { result, .. } => {
            result_text = display_text(result);
            let grounding = result.as_ref().ok().map(|found| &found.grounding);
            (None, Outcome::Result { markdown: &result_text, grounding })
        }
    };

    let html = render_page(&PageView {
        fatal,
        log: session.store.read_all_reversed(),
        topic: &topic,
        outcome,
    });
    (jar.add(session_cookie(id)), Html(html))
}

pub async fn end_session(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    if let Some(id) = session_id(&jar) {
        state.sessions.end(id).await;
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/"))
}
