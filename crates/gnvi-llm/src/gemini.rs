//! Google Gemini backend over the REST `generateContent` endpoint.
//!
//! The key travels in the `x-goog-api-key` header (marked sensitive so it
//! never shows up in debug output). When the request asks for
//! [`Tool::GoogleSearch`] the `google_search` tool is attached and the
//! response's grounding metadata is parsed alongside the text.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

use crate::backend::{
    check_response_status, GroundingMetadata, GroundingSource, LlmBackend, LlmError, LlmRequest,
    LlmResponse, Role, Tool,
};

pub use gnvi_common::config::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};

pub struct GeminiBackend {
    pub model: String,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiBackend {
    pub fn new(api_key: &SecretString, model: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_base_url(api_key, model, DEFAULT_GEMINI_BASE_URL)
    }

    /// Build a client bound to `api_key`. Fails on a malformed key or if the
    /// HTTP client cannot be initialised; no request is sent here.
    pub fn with_base_url(
        api_key: &SecretString,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let key = api_key.expose_secret().trim();
        validate_api_key(key)?;

        let mut value = HeaderValue::from_str(key).map_err(|_| {
            LlmError::InvalidApiKey("key is not a valid HTTP header value".to_string())
        })?;
        value.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert("x-goog-api-key", value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("gnvi/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url: String = base_url.into();
        Ok(Self {
            model: model.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

fn validate_api_key(key: &str) -> Result<(), LlmError> {
    if key.is_empty() {
        return Err(LlmError::InvalidApiKey("no API key provided".to_string()));
    }
    if !key.chars().all(|c| c.is_ascii_graphic()) {
        return Err(LlmError::InvalidApiKey(
            "key contains whitespace or non-printable characters".to_string(),
        ));
    }
    Ok(())
}

/// Convert an [`LlmRequest`] into a `generateContent` body.
/// System message → `systemInstruction`; everything else is a `user` turn.
pub fn build_request_body(req: &LlmRequest) -> Value {
    let contents: Vec<Value> = req.messages.iter()
        .filter(|m| m.role != Role::System)
        .map(|m| json!({
            "role": "user",
            "parts": [{ "text": m.content }]
        }))
        .collect();

    let mut generation_config = serde_json::Map::new();
    if let Some(t) = req.temperature {
        generation_config.insert("temperature".to_string(), json!(t));
    }
    if let Some(n) = req.max_tokens {
        generation_config.insert("maxOutputTokens".to_string(), json!(n));
    }

    let mut body = json!({ "contents": contents });
    if !generation_config.is_empty() {
        body["generationConfig"] = Value::Object(generation_config);
    }
    if let Some(sys) = req.system_instruction() {
        body["systemInstruction"] = json!({ "parts": [{ "text": sys }] });
    }
    if !req.tools.is_empty() {
        let tools: Vec<Value> = req.tools.iter()
            .map(|tool| match tool {
                Tool::GoogleSearch => json!({ "google_search": {} }),
            })
            .collect();
        body["tools"] = Value::Array(tools);
    }
    body
}

/// Extract text, usage and grounding from a `generateContent` response.
pub fn parse_response(json: &Value, model: &str) -> Result<LlmResponse, LlmError> {
    let candidate = &json["candidates"][0];

    let content: String = candidate["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts.iter()
                .filter(|p| !p["thought"].as_bool().unwrap_or(false))
                .filter_map(|p| p["text"].as_str())
                .collect()
        })
        .unwrap_or_default();

    if content.is_empty() {
        let block_reason = json["promptFeedback"]["blockReason"]
            .as_str()
            .or_else(|| candidate["finishReason"].as_str().filter(|r| *r != "STOP"))
            .map(str::to_string);
        return Err(LlmError::EmptyResponse { block_reason });
    }

    Ok(LlmResponse {
        content,
        model: json["modelVersion"].as_str().unwrap_or(model).to_string(),
        prompt_tokens:     json["usageMetadata"]["promptTokenCount"].as_u64().unwrap_or(0) as u32,
        completion_tokens: json["usageMetadata"]["candidatesTokenCount"].as_u64().unwrap_or(0) as u32,
        grounding: parse_grounding(&candidate["groundingMetadata"]),
    })
}

fn parse_grounding(meta: &Value) -> GroundingMetadata {
    let search_queries = meta["webSearchQueries"]
        .as_array()
        .map(|qs| qs.iter().filter_map(|q| q.as_str().map(str::to_string)).collect())
        .unwrap_or_default();

    let mut sources: Vec<GroundingSource> = Vec::new();
    for chunk in meta["groundingChunks"].as_array().into_iter().flatten() {
        let Some(uri) = chunk["web"]["uri"].as_str() else { continue };
        if sources.iter().any(|s| s.uri == uri) {
            continue;
        }
        sources.push(GroundingSource {
            uri: uri.to_string(),
            title: chunk["web"]["title"].as_str().map(str::to_string),
        });
    }

    GroundingMetadata { search_queries, sources }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let model = req.model.clone().unwrap_or_else(|| self.model.clone());
        let body = build_request_body(&req);

        tracing::debug!(
            model = %model,
            grounded = req.uses_tool(Tool::GoogleSearch),
            "Sending generateContent request"
        );

        let resp = self.client.post(self.endpoint(&model)).json(&body).send().await?;
        let json = check_response_status(resp).await?;
        let response = parse_response(&json, &model)?;

        tracing::debug!(
            sources = response.grounding.sources.len(),
            queries = response.grounding.search_queries.len(),
            "Grounding metadata received"
        );
        Ok(response)
    }

    fn model_id(&self) -> &str { &self.model }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Message;
    use axum::{extract::State, http::{StatusCode, Uri}, Json, Router};
    use std::sync::{Arc, Mutex};

    fn key(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn grounded_request() -> LlmRequest {
        LlmRequest {
            messages: vec![Message::system("persona"), Message::user("find things")],
            model: None,
            max_tokens: None,
            temperature: Some(0.4),
            tools: vec![Tool::GoogleSearch],
        }
    }

    #[test]
    fn test_gemini_backend_model_id() {
        let b = GeminiBackend::new(&key("AIza-test"), "gemini-2.5-flash").unwrap();
        assert_eq!(b.model_id(), "gemini-2.5-flash");
    }

    #[test]
    fn test_empty_key_rejected() {
        let err = GeminiBackend::new(&key("   "), "gemini-2.5-flash").unwrap_err();
        assert!(matches!(err, LlmError::InvalidApiKey(_)));
    }

    #[test]
    fn test_key_with_inner_whitespace_rejected() {
        let err = GeminiBackend::new(&key("AIza bad"), "gemini-2.5-flash").unwrap_err();
        assert!(err.to_string().contains("whitespace"));
    }

    #[test]
    fn test_debug_hides_key() {
        let b = GeminiBackend::new(&key("AIza-hidden"), "m").unwrap();
        assert!(!format!("{:?}", b).contains("AIza-hidden"));
    }

    #[test]
    fn test_body_carries_tool_system_and_temperature() {
        let body = build_request_body(&grounded_request());
        assert_eq!(body["tools"], json!([{ "google_search": {} }]));
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "persona");
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.4).abs() < 1e-6);
        assert!(body["generationConfig"].get("maxOutputTokens").is_none());
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[0]["parts"][0]["text"], "find things");
    }

    #[test]
    fn test_body_without_tools_or_config() {
        let req = LlmRequest { messages: vec![Message::user("hi")], ..Default::default() };
        let body = build_request_body(&req);
        assert!(body.get("tools").is_none());
        assert!(body.get("generationConfig").is_none());
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_parse_joins_text_parts_and_grounding() {
        let json = json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "planning", "thought": true },
                    { "text": "| # | URL/Domain |" },
                    { "text": "\n| 1 | https://a.example |" }
                ]},
                "finishReason": "STOP",
                "groundingMetadata": {
                    "webSearchQueries": ["quantum computing 2025"],
                    "groundingChunks": [
                        { "web": { "uri": "https://a.example", "title": "A" } },
                        { "web": { "uri": "https://a.example", "title": "A again" } },
                        { "web": { "uri": "https://b.example" } }
                    ]
                }
            }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 34 }
        });
        let resp = parse_response(&json, "gemini-2.5-flash").unwrap();
        assert_eq!(resp.content, "| # | URL/Domain |\n| 1 | https://a.example |");
        assert_eq!(resp.model, "gemini-2.5-flash");
        assert_eq!(resp.prompt_tokens, 12);
        assert_eq!(resp.completion_tokens, 34);
        assert_eq!(resp.grounding.search_queries, vec!["quantum computing 2025"]);
        assert_eq!(resp.grounding.sources.len(), 2);
        assert_eq!(resp.grounding.sources[1].title, None);
    }

    #[test]
    fn test_parse_blocked_prompt() {
        let json = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        match parse_response(&json, "m") {
            Err(LlmError::EmptyResponse { block_reason }) => {
                assert_eq!(block_reason.as_deref(), Some("SAFETY"))
            }
            other => panic!("expected EmptyResponse, got {other:?}"),
        }
    }

    // ── In-process fake endpoint ──────────────────────────────────────────────

    #[derive(Debug, Clone)]
    struct Captured {
        path: String,
        api_key: Option<String>,
        body: Value,
    }

    type Log = Arc<Mutex<Vec<Captured>>>;

    async fn spawn_fake(status: StatusCode, reply: Value) -> (String, Log) {
        let log: Log = Arc::default();
        let app = Router::new()
            .fallback(move |State(log): State<Log>, headers: HeaderMap, uri: Uri, Json(body): Json<Value>| {
                let reply = reply.clone();
                async move {
                    log.lock().unwrap().push(Captured {
                        path: uri.path().to_string(),
                        api_key: headers
                            .get("x-goog-api-key")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string),
                        body,
                    });
                    (status, Json(reply))
                }
            })
            .with_state(log.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), log)
    }

    #[tokio::test]
    async fn test_complete_against_fake_endpoint() {
        let reply = json!({
            "candidates": [{ "content": { "parts": [{ "text": "| # | URL/Domain |" }] } }]
        });
        let (base, log) = spawn_fake(StatusCode::OK, reply).await;
        let backend = GeminiBackend::with_base_url(&key("AIza-fake"), "gemini-2.5-flash", base).unwrap();

        let resp = backend.complete(grounded_request()).await.unwrap();
        assert_eq!(resp.content, "| # | URL/Domain |");

        let calls = log.lock().unwrap().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path, "/v1beta/models/gemini-2.5-flash:generateContent");
        assert_eq!(calls[0].api_key.as_deref(), Some("AIza-fake"));
        assert_eq!(calls[0].body["tools"][0], json!({ "google_search": {} }));
    }

    #[tokio::test]
    async fn test_complete_maps_api_error() {
        let reply = json!({ "error": { "code": 429, "message": "Resource has been exhausted" } });
        let (base, _log) = spawn_fake(StatusCode::TOO_MANY_REQUESTS, reply).await;
        let backend = GeminiBackend::with_base_url(&key("AIza-fake"), "gemini-2.5-flash", base).unwrap();

        match backend.complete(grounded_request()).await {
            Err(LlmError::ApiError { status, message }) => {
                assert_eq!(status, 429);
                assert_eq!(message, "Resource has been exhausted");
            }
            other => panic!("expected ApiError, got {other:?}"),
        }
    }
}
