//! Text generation through the Anthropic Messages API.
//!
//! # Architecture
//!
//! - [`AskAsync`]: the seam the daily run talks to, so the pipeline can run
//!   against a stub in tests
//! - [`AnthropicClient`]: one HTTP JSON POST per call, fixed timeout, no retry
//! - [`parse_structured_response`]: pull `title`/`content` out of the model's
//!   JSON answer, tolerating a Markdown fence around it
//!
//! A failed call is not retried here. The run that needed it is abandoned
//! and the next invocation of the whole process tries again.

use crate::error::{PostError, PostResult};
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";
pub const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 2200;
const TEMPERATURE: f32 = 0.4;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Trait for async LLM interaction.
///
/// Implementors send a system prompt and a user prompt and return the
/// model's raw text answer.
pub trait AskAsync {
    async fn ask(&self, system_prompt: &str, user_prompt: &str) -> PostResult<String>;
}

/// Connection settings for the Messages API.
#[derive(Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
}

impl LlmConfig {
    /// Build a config, rejecting a missing or blank API key.
    ///
    /// A blank model falls back to [`DEFAULT_MODEL`].
    pub fn new(api_key: Option<&str>, model: Option<&str>) -> PostResult<Self> {
        let api_key = api_key.map(str::trim).unwrap_or_default();
        if api_key.is_empty() {
            return Err(PostError::Config("ANTHROPIC_API_KEY is not set".into()));
        }
        let model = model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MODEL);
        Ok(Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            endpoint: MESSAGES_URL.to_string(),
        })
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// [`AskAsync`] over `reqwest`, one attempt per call.
#[derive(Debug)]
pub struct AnthropicClient {
    config: LlmConfig,
    http: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(config: LlmConfig) -> PostResult<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { config, http })
    }
}

impl AskAsync for AnthropicClient {
    #[instrument(level = "info", skip_all, fields(model = %self.config.model))]
    async fn ask(&self, system_prompt: &str, user_prompt: &str) -> PostResult<String> {
        let t0 = Instant::now();
        let payload = MessagesRequest {
            model: &self.config.model,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system: system_prompt,
            messages: [Message {
                role: "user",
                content: user_prompt,
            }],
        };

        let response = self
            .http
            .post(&self.config.endpoint)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                body = %truncate_for_log(&body, 300),
                "Messages API returned an error"
            );
            return Err(PostError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: MessagesResponse = response.json().await?;
        let text = collect_text(&body);
        if text.is_empty() {
            return Err(PostError::Format("Messages API returned empty content".into()));
        }
        info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            chars = text.chars().count(),
            "Messages API call succeeded"
        );
        Ok(text)
    }
}

/// Join the text blocks of a response, skipping tool or other block types.
fn collect_text(body: &MessagesResponse) -> String {
    body.content
        .iter()
        .filter(|block| block.kind == "text")
        .map(|block| block.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

static FENCE_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^```(?:json)?\s*").unwrap());
static FENCE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*```$").unwrap());
static OBJECT_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Remove a Markdown code fence wrapped around the whole answer.
pub fn strip_code_fence(text: &str) -> String {
    let text = text.trim();
    if !text.starts_with("```") {
        return text.to_string();
    }
    let opened = FENCE_OPEN.replace(text, "");
    FENCE_CLOSE.replace(&opened, "").trim().to_string()
}

/// Extract `(title, content)` from the model's JSON answer.
///
/// The whole (de-fenced) text is parsed first; failing that, the widest
/// `{ ... }` span inside it.
///
/// # Errors
///
/// [`PostError::Format`] when no JSON object can be found, and
/// [`PostError::Json`] when the span found is not valid JSON. Either field
/// being empty after trimming is also a [`PostError::Format`].
pub fn parse_structured_response(raw: &str) -> PostResult<(String, String)> {
    let candidate = strip_code_fence(raw);
    let data: Value = match serde_json::from_str(&candidate) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "Direct JSON parse failed; searching for an object span");
            let span = OBJECT_SPAN.find(&candidate).ok_or_else(|| {
                PostError::Format(format!(
                    "no JSON object in model response: {}",
                    truncate_for_log(&candidate, 120)
                ))
            })?;
            serde_json::from_str(span.as_str())?
        }
    };

    let title = field_text(&data, "title");
    let content = field_text(&data, "content");
    if title.is_empty() || content.is_empty() {
        return Err(PostError::Format("model response missing title/content".into()));
    }
    Ok((title, content))
}

fn field_text(data: &Value, key: &str) -> String {
    match data.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string().trim().to_string(),
    }
}
