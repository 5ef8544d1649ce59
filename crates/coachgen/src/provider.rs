//! The generation capability: prompt and output schema in, candidate JSON out.
//!
//! [`RoutineProvider`] is the only seam between the flow and the outside
//! world. Implementations may be non-deterministic and may fail for any
//! reason; the flow treats every result as untrusted and validates it.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use tracing::debug;

use crate::error::ProviderError;
use crate::{ChatRequest, Message, OpenRouterClient, Plugin, ResponseFormat};

/// Boxed future returned by [`RoutineProvider::generate`].
pub type ProviderFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Value, ProviderError>> + Send + 'a>>;

/// Schema name sent alongside the output schema.
pub const OUTPUT_SCHEMA_NAME: &str = "workout_routine";

/// An external capability that turns a prompt into structured output.
pub trait RoutineProvider: Send + Sync {
    /// Label used in logs.
    fn name(&self) -> &str {
        "provider"
    }

    /// Produce a candidate for `output_schema` from `prompt`.
    fn generate<'a>(&'a self, prompt: &'a str, output_schema: &'a Value) -> ProviderFuture<'a>;
}

// ── OpenRouter ─────────────────────────────────────────────────────

/// Provider backed by an OpenRouter chat model using structured output.
pub struct OpenRouterProvider {
    client: OpenRouterClient,
    model: String,
    max_tokens: u32,
    temperature: f32,
    response_healing: bool,
}

impl OpenRouterProvider {
    pub fn new(client: OpenRouterClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens: 4096,
            temperature: 0.4,
            response_healing: true,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Enable OpenRouter's response-healing plugin. Default: on.
    pub fn with_response_healing(mut self, enabled: bool) -> Self {
        self.response_healing = enabled;
        self
    }

    fn request(&self, prompt: &str, output_schema: &Value) -> ChatRequest {
        ChatRequest {
            model: Some(self.model.clone()),
            messages: vec![Message::user(prompt)],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            response_format: Some(ResponseFormat::json_schema(
                OUTPUT_SCHEMA_NAME,
                output_schema.clone(),
            )),
            plugins: self.response_healing.then(|| vec![Plugin::ResponseHealing]),
            ..Default::default()
        }
    }
}

impl RoutineProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        &self.model
    }

    fn generate<'a>(&'a self, prompt: &'a str, output_schema: &'a Value) -> ProviderFuture<'a> {
        Box::pin(async move {
            let body = self.request(prompt, output_schema);
            let completion = self.client.chat(&body).await?;
            debug!("finish_reason={:?}", completion.finish_reason);
            let content = completion
                .content
                .filter(|c| !c.trim().is_empty())
                .ok_or(ProviderError::EmptyResponse)?;
            parse_json_content(&content)
        })
    }
}

impl fmt::Debug for OpenRouterProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRouterProvider")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// Parse model text as JSON, tolerating a surrounding markdown code fence.
pub fn parse_json_content(content: &str) -> Result<Value, ProviderError> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
        .map(strip_info_string)
        .unwrap_or(trimmed);
    serde_json::from_str(body.trim()).map_err(|e| ProviderError::MalformedJson(e.to_string()))
}

/// Drop an info string such as `json` from the opening fence, whether or
/// not a newline follows it.
fn strip_info_string(inner: &str) -> &str {
    let info_len = inner
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '-' && c != '_')
        .unwrap_or(inner.len());
    match inner.get(..info_len) {
        Some(info) if info.starts_with(|c: char| c.is_ascii_alphabetic()) => {
            inner.get(info_len..).unwrap_or(inner)
        }
        _ => inner,
    }
}

// ── Closures ───────────────────────────────────────────────────────

type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, ProviderError>> + Send>>;
type ErasedHandler = dyn Fn(String) -> HandlerFuture + Send + Sync;

/// A provider backed by an async closure that receives the rendered prompt.
///
/// ```
/// use coachgen::provider::FnProvider;
/// use serde_json::json;
///
/// let provider = FnProvider::new(|prompt: String| async move {
///     Ok(json!({ "workoutRoutine": [], "notes": format!("{} chars of prompt", prompt.len()) }))
/// });
/// ```
pub struct FnProvider {
    label: String,
    handler: Box<ErasedHandler>,
}

impl FnProvider {
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ProviderError>> + Send + 'static,
    {
        let erased = move |prompt: String| -> HandlerFuture { Box::pin(handler(prompt)) };
        Self {
            label: "fn".to_string(),
            handler: Box::new(erased),
        }
    }

    /// A provider that always answers with `value`.
    pub fn returning(value: Value) -> Self {
        Self::new(move |_| {
            let value = value.clone();
            async move { Ok(value) }
        })
        .labelled("fixed")
    }

    /// A provider that always fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |_| {
            let message = message.clone();
            async move { Err(ProviderError::Other(message)) }
        })
        .labelled("failing")
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

impl RoutineProvider for FnProvider {
    fn name(&self) -> &str {
        &self.label
    }

    fn generate<'a>(&'a self, prompt: &'a str, _output_schema: &'a Value) -> ProviderFuture<'a> {
        (self.handler)(prompt.to_string())
    }
}

impl fmt::Debug for FnProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProvider")
            .field("label", &self.label)
            .finish()
    }
}
