//! HTML rendering: the discovery page and model markdown.

use gnvi_discovery::MAX_TOPIC_CHARS;
use gnvi_llm::GroundingMetadata;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

pub const PAGE_TITLE: &str = "🌟 Neural WWW Discovery Tool";
pub const BUSY_TEXT: &str =
    "⚡ NEURAL VECTORING: Indexing massive data exchange for 20 unique URL relationships...";

/// Escape text for use in HTML bodies and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn is_safe_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    if ["http://", "https://", "mailto:"].iter().any(|p| lower.starts_with(p)) {
        return true;
    }
    // Relative or fragment links carry no scheme before the first '/', '?' or '#'.
    let scheme_end = lower.find(':');
    let path_start = lower.find(|c: char| matches!(c, '/' | '?' | '#'));
    match (scheme_end, path_start) {
        (None, _) => true,
        (Some(colon), Some(slash)) => slash < colon,
        (Some(_), None) => false,
    }
}

/// CommonMark + GFM tables. Raw HTML is shown as text and links with
/// unexpected schemes are neutralised.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let events = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link { link_type, dest_url, title, id }) if !is_safe_url(&dest_url) => {
            Event::Start(Tag::Link { link_type, dest_url: CowStr::Borrowed("#"), title, id })
        }
        Event::Start(Tag::Image { link_type, dest_url, title, id }) if !is_safe_url(&dest_url) => {
            Event::Start(Tag::Image { link_type, dest_url: CowStr::Borrowed("#"), title, id })
        }
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut out, events);
    out
}

/// The outcome block shown under the form.
pub enum Outcome<'a> {
    None,
    /// Validation or guard message; nothing was sent.
    Warning(String),
    Error(String),
    /// Text of the discovery (model markdown or the failure message).
    Result { markdown: &'a str, grounding: Option<&'a GroundingMetadata> },
}

pub struct PageView<'a> {
    pub fatal: Option<&'a str>,
    /// Most recent first.
    pub log: Vec<&'a str>,
    pub topic: &'a str,
    pub outcome: Outcome<'a>,
}

fn render_log(entries: &[&str]) -> String {
    entries.iter()
        .map(|e| format!(r#"<pre class="log-entry"><code>{}</code></pre>"#, escape_html(e)))
        .collect()
}

fn render_grounding(grounding: &GroundingMetadata) -> String {
    if grounding.is_empty() {
        return String::new();
    }
    let sources: String = grounding.sources.iter().map(|s| {
        let label = s.title.as_deref().unwrap_or(&s.uri);
        if is_safe_url(&s.uri) {
            format!(r#"<li><a href="{}" target="_blank" rel="noopener noreferrer">{}</a></li>"#,
                escape_html(&s.uri), escape_html(label))
        } else {
            format!("<li>{}</li>", escape_html(label))
        }
    }).collect();
    let queries = grounding.search_queries.iter()
        .map(|q| format!("<code>{}</code>", escape_html(q)))
        .collect::<Vec<_>>()
        .join(", ");

    format!(r#"
        <details class="grounding">
            <summary>Search grounding ({} sources)</summary>
            <ul>{}</ul>
            {}
        </details>"#,
        grounding.sources.len(),
        sources,
        if queries.is_empty() { String::new() } else { format!("<p class=\"caption\">Queries: {}</p>", queries) })
}

fn render_outcome(outcome: &Outcome<'_>) -> String {
    match outcome {
        Outcome::None => String::new(),
        Outcome::Warning(msg) => format!(r#"<div class="alert alert-warning">{}</div>"#, escape_html(msg)),
        Outcome::Error(msg) => format!(r#"<div class="alert alert-error">{}</div>"#, escape_html(msg)),
        Outcome::Result { markdown, grounding } => format!(r#"
    <hr>
    <section class="results">
        <h2>🌐 20 URL Output Relationship to User Input</h2>
        <h3>Fascinatingly Connected Domains from Neural Search</h3>
        <div class="markdown">{}</div>
        {}
    </section>"#,
            markdown_to_html(markdown),
            grounding.map(render_grounding).unwrap_or_default()),
    }
}

pub fn render_page(view: &PageView<'_>) -> String {
    let fatal_html = view.fatal
        .map(|msg| format!(r#"<div class="alert alert-error">{}</div>"#, escape_html(msg)))
        .unwrap_or_default();

    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title} (Gemini API)</title>
    <style>
        body {{ margin: 0; font-family: system-ui, sans-serif; display: flex; min-height: 100vh; }}
        aside {{ width: 320px; background: #f0f2f6; padding: 1rem; overflow-y: auto; max-height: 100vh; position: sticky; top: 0; }}
        main {{ flex: 1; padding: 2rem 3rem; max-width: 1200px; }}
        .caption {{ color: #6b7280; font-size: 0.85rem; }}
        .log-entry {{ background: #fff; padding: 0.5rem; border-radius: 4px; white-space: pre-wrap; font-size: 0.8rem; }}
        textarea {{ width: 100%; height: 100px; font-size: 1rem; box-sizing: border-box; }}
        button {{ width: 100%; padding: 0.75rem; font-size: 1rem; background: #ff4b4b; color: #fff; border: 0; border-radius: 6px; cursor: pointer; }}
        button:disabled {{ opacity: 0.6; cursor: wait; }}
        .alert {{ padding: 0.75rem 1rem; border-radius: 6px; margin: 1rem 0; }}
        .alert-warning {{ background: #fffbe6; color: #926c05; }}
        .alert-error {{ background: #ffecec; color: #9b1c1c; }}
        .alert-info {{ background: #e8f0fe; color: #1c4e9b; }}
        #busy {{ display: none; margin-top: 1rem; }}
        .markdown table {{ border-collapse: collapse; width: 100%; }}
        .markdown th, .markdown td {{ border: 1px solid #d1d5db; padding: 0.4rem 0.6rem; text-align: left; vertical-align: top; }}
    </style>
</head>
<body>
<aside>
    <h2>🚦 I/O Trafficking Logger</h2>
    <p class="caption">Tracking the massive exchange of data.</p>
    {log}
    <form method="POST" action="/session/end"><button type="submit">End session</button></form>
</aside>
<main>
    <h1>{title}</h1>
    <p>A <strong>high-performance AI algorithm</strong> utilizing the Gemini API's massive search and indexing capabilities to find
    <strong>20 deeply connected URLs</strong> based on your input summary. This simulates an instant, <strong>full WWW catalogue indexing</strong> by leveraging Google's real-time knowledge graph.</p>
    <hr>
    {fatal}
    <h2>User URL Search Input Widget</h2>
    <form method="POST" action="/discover" onsubmit="document.getElementById('run').disabled = true; document.getElementById('busy').style.display = 'block';">
        <label for="topic">Enter a single word or a brief summary (Max {max} Characters):</label>
        <textarea id="topic" name="topic" maxlength="{max}"
            placeholder="e.g., 'sustainable urban farming and hydroponics applications' or 'quantum computing breakthroughs'">{topic}</textarea>
        <button id="run" type="submit">🚀 Execute Neural Discovery (20 URL Output)</button>
        <div id="busy" class="alert alert-info">{busy}</div>
    </form>
    {outcome}
    <hr>
    <div class="alert alert-info">The complexity of indexing the full WWW is computationally infeasible for a single application. This tool leverages the <strong>Google Search grounding tool</strong> within the Gemini API to provide the most relevant and powerful simulation of this massive search capability.</div>
</main>
</body>
</html>"#,
        title = PAGE_TITLE,
        log = render_log(&view.log),
        fatal = fatal_html,
        max = MAX_TOPIC_CHARS,
        topic = escape_html(view.topic),
        busy = BUSY_TEXT,
        outcome = render_outcome(&view.outcome),
    )
}
