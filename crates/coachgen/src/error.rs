//! Error types for routine generation.
//!
//! [`GenerationError`] is the terminal failure of a single
//! [`RoutineGenerator::generate`](crate::flow::RoutineGenerator::generate) call.
//! Every variant ends that call; nothing is retried and no partial result is
//! returned. [`ProviderError`] is the opaque upstream failure reported by a
//! [`RoutineProvider`](crate::provider::RoutineProvider).

use thiserror::Error;

use crate::schema::Violation;

/// Failure of the external generation capability.
///
/// The flow never inspects these beyond logging them: the provider is
/// treated as an untrusted black box.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("OpenRouter API HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("OpenRouter API error: {0}")]
    Api(String),

    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error("provider returned malformed JSON: {0}")]
    MalformedJson(String),

    #[error("{0}")]
    Other(String),
}

/// Terminal failure of one generation attempt.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid input: {}", join_violations(.0))]
    InvalidInput(Vec<Violation>),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("invalid output: {}", join_violations(.0))]
    InvalidOutput(Vec<Violation>),

    #[error("empty routine without a recommendation to consult a professional")]
    MissingSafetyAdvisory,

    /// Only raised when strict image URL checking is enabled.
    #[error("image URL for '{exercise}' does not follow the expected format: {url}")]
    ImageUrlFormat { exercise: String, url: String },
}

impl GenerationError {
    /// Short machine-readable tag, used in logs and HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::InvalidInput(_) => "invalid_input",
            GenerationError::Provider(_) => "provider_error",
            GenerationError::InvalidOutput(_) => "invalid_output",
            GenerationError::MissingSafetyAdvisory => "missing_safety_advisory",
            GenerationError::ImageUrlFormat { .. } => "image_url_format",
        }
    }

    /// Violations carried by `InvalidInput` / `InvalidOutput`; empty otherwise.
    pub fn violations(&self) -> &[Violation] {
        match self {
            GenerationError::InvalidInput(v) | GenerationError::InvalidOutput(v) => v,
            _ => &[],
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
