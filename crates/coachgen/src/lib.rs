//! Schema-validated workout routine generation on top of an LLM provider.
//!
//! `coachgen` turns a user profile into a personalized workout routine by
//! rendering a prompt, handing it to an external generative model, and
//! re-validating whatever comes back. The model is never trusted: its output
//! passes the same schema checks on every call, plus a safety cross-check on
//! empty routines.
//!
//! # Getting started
//!
//! ```ignore
//! use coachgen::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), String> {
//!     let api_key = std::env::var("OPENROUTER_KEY").map_err(|e| e.to_string())?;
//!     let config = GeneratorConfig::default();
//!     let generator = config.build_generator(api_key).map_err(|e| e.to_string())?;
//!
//!     let generation = generator
//!         .generate(&json!({
//!             "sex": "male",
//!             "age": 30,
//!             "heightCm": 180,
//!             "weightKg": 80,
//!             "fitnessGoal": "muscle gain",
//!             "healthConditions": "None",
//!             "sportsActivities": "None",
//!             "documentation": "General strength training guidelines."
//!         }))
//!         .await
//!         .map_err(|e| e.to_string())?;
//!
//!     println!("{}", render_summary(&generation.result));
//!     Ok(())
//! }
//! ```
//!
//! # Where to find things
//!
//! - **Input and output shapes:** [`UserProfile`](profile::UserProfile),
//!   [`Exercise`](routine::Exercise), [`GenerationResult`](routine::GenerationResult),
//!   validated by [`SchemaValidator`](schema::SchemaValidator).
//! - **The prompt:** [`render_prompt`](prompt::render_prompt).
//! - **The provider seam:** [`RoutineProvider`](provider::RoutineProvider),
//!   with [`OpenRouterProvider`](provider::OpenRouterProvider) for real calls
//!   and [`FnProvider`](provider::FnProvider) for closures and tests.
//! - **The flow:** [`RoutineGenerator`](flow::RoutineGenerator).
//! - **Raw form input:** [`ProfileForm`](form::ProfileForm).
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`profile`] | Input schema |
//! | [`routine`] | Output schema, slugs, image URLs |
//! | [`schema`] | Shape, typing and constraint validation |
//! | [`prompt`] | Prompt builder and template |
//! | [`provider`] | Generation capability trait and implementations |
//! | [`flow`] | Validate → call → validate → cross-check |
//! | [`form`] | Raw form fields, user-facing messages, result summary |
//! | [`config`] | Generator defaults |
//! | [`logging`] | `tracing-subscriber` setup for binaries |
//! | [`error`] | Error taxonomy |

pub mod config;
pub mod error;
pub mod flow;
pub mod form;
pub mod logging;
pub mod prelude;
pub mod profile;
pub mod prompt;
pub mod provider;
pub mod routine;
pub mod schema;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::error::ProviderError;

// Re-export schemars for downstream crates.
pub use schemars;

// ── Constants ──────────────────────────────────────────────────────

pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default model for routine generation.
pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-001";

/// Default HTTP timeout for provider calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

// ── Schema generation ──────────────────────────────────────────────

/// Generate a JSON Schema `serde_json::Value` from a type that implements
/// `schemars::JsonSchema`.
///
/// # Example
///
/// ```
/// use coachgen::json_schema_for;
/// use coachgen::routine::GenerationResult;
///
/// let schema = json_schema_for::<GenerationResult>();
/// assert_eq!(schema["type"], "object");
/// assert!(schema["required"].as_array().unwrap().contains(&"notes".into()));
/// ```
pub fn json_schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}

// ── Request types ──────────────────────────────────────────────────

/// Chat completion request body. Unused optional fields are omitted from
/// serialization.
#[derive(Serialize, Debug, Default)]
pub struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    pub messages: Vec<Message>,

    #[serde(skip_serializing_if = "is_zero_u32")]
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "is_zero_f32")]
    pub temperature: f32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugins: Option<Vec<Plugin>>,
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}
fn is_zero_f32(v: &f32) -> bool {
    *v == 0.0
}

/// JSON output format type.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum ResponseFormatType {
    #[serde(rename = "json_schema")]
    JsonSchema,
}

/// Structured output request.
#[derive(Serialize, Debug)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub fmt_type: ResponseFormatType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<JsonSchemaSpec>,
}

impl ResponseFormat {
    /// Ask for output conforming to `schema`.
    pub fn json_schema(name: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            fmt_type: ResponseFormatType::JsonSchema,
            json_schema: Some(JsonSchemaSpec {
                name: name.into(),
                strict: false,
                schema,
            }),
        }
    }
}

/// Named schema attached to a `json_schema` response format.
#[derive(Serialize, Debug)]
pub struct JsonSchemaSpec {
    pub name: String,
    pub strict: bool,
    pub schema: serde_json::Value,
}

/// OpenRouter plugin configuration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "id")]
pub enum Plugin {
    /// Auto-fixes truncated or malformed JSON in structured responses.
    #[serde(rename = "response-healing")]
    ResponseHealing,
}

// ── Message types ──────────────────────────────────────────────────

/// Role of a request message. The prompt is sent as a single user turn.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
}

/// A message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Message {
    pub role: MessageRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: Some(content.into()),
        }
    }
}

// ── Response types ─────────────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

/// Clean return type from [`OpenRouterClient::chat`].
#[derive(Debug)]
pub struct ChatCompletion {
    pub content: Option<String>,
    pub usage: Option<UsageInfo>,
    pub finish_reason: Option<String>,
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for the OpenRouter chat completions API.
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    referer: String,
    title: String,
    endpoint: String,
}

impl OpenRouterClient {
    /// Create a new client with the given API key and default headers.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::with_headers(api_key, "https://github.com/coachgen", "coachgen")
    }

    /// Create a new client with custom Referer and X-Title headers.
    pub fn with_headers(
        api_key: impl Into<String>,
        referer: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        Self::with_timeout(api_key, referer, title, DEFAULT_TIMEOUT)
    }

    /// Like [`with_headers`](Self::with_headers) with an explicit transport timeout.
    pub fn with_timeout(
        api_key: impl Into<String>,
        referer: impl Into<String>,
        title: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent("coachgen/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Client(e.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            referer: referer.into(),
            title: title.into(),
            endpoint: OPENROUTER_URL.to_string(),
        })
    }

    /// Point the client at a different chat-completions endpoint
    /// (a proxy, or a local stub).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Send a chat completion request.
    pub async fn chat(&self, body: &ChatRequest) -> Result<ChatCompletion, ProviderError> {
        debug!(
            "LLM request: model={}, messages={}, max_tokens={}, temp={}",
            body.model.as_deref().unwrap_or("(none)"),
            body.messages.len(),
            body.max_tokens,
            body.temperature,
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ProviderError::Request(format!("failed to read response: {e}")))?;

        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: RawChatResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::Api(format!("failed to parse response: {e}")))?;

        if let Some(err) = parsed.error {
            return Err(ProviderError::Api(err.message));
        }

        if let Some(ref usage) = parsed.usage {
            debug!(
                "Token usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens.unwrap_or(0),
                usage.completion_tokens.unwrap_or(0),
                usage.total_tokens.unwrap_or(0),
            );
        }

        let choice = parsed.choices.and_then(|c| c.into_iter().next());
        match choice {
            Some(c) => {
                debug!(
                    "LLM output: {} chars",
                    c.message.content.as_ref().map_or(0, |s| s.len())
                );
                Ok(ChatCompletion {
                    content: c.message.content,
                    usage: parsed.usage,
                    finish_reason: c.finish_reason,
                })
            }
            None => {
                debug!("LLM output: empty (no choices)");
                Ok(ChatCompletion {
                    content: None,
                    usage: parsed.usage,
                    finish_reason: None,
                })
            }
        }
    }
}
