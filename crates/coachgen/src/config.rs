//! Generator configuration with sensible defaults.
//!
//! [`GeneratorConfig`] captures the knobs a deployment usually touches and
//! turns them into a ready [`RoutineGenerator`] via
//! [`build_generator`](GeneratorConfig::build_generator).

use std::time::Duration;

use crate::error::ProviderError;
use crate::flow::RoutineGenerator;
use crate::provider::OpenRouterProvider;
use crate::routine::DEFAULT_IMAGE_BASE;
use crate::{DEFAULT_MODEL, DEFAULT_TIMEOUT, OpenRouterClient};

/// Environment variable holding the OpenRouter API key.
pub const API_KEY_ENV: &str = "OPENROUTER_KEY";

/// Settings for a routine generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,
    /// Maximum tokens in the provider response. Default: `4096`.
    pub max_tokens: u32,
    /// Sampling temperature. Default: `0.4`.
    pub temperature: f32,
    /// Placeholder image host. Default: `https://picsum.photos`.
    pub image_base: String,
    /// Fail instead of warning when an image URL has the wrong prefix.
    /// Default: `false`.
    pub strict_image_urls: bool,
    /// Ask OpenRouter to repair malformed JSON. Default: `true`.
    pub response_healing: bool,
    /// Transport timeout for the provider call. Default: 120 s.
    pub timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 4096,
            temperature: 0.4,
            image_base: DEFAULT_IMAGE_BASE.to_string(),
            strict_image_urls: false,
            response_healing: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl GeneratorConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_strict_image_urls(mut self, strict: bool) -> Self {
        self.strict_image_urls = strict;
        self
    }

    pub fn with_image_base(mut self, base: impl Into<String>) -> Self {
        self.image_base = base.into();
        self
    }

    /// Build the OpenRouter-backed provider described by this config.
    pub fn build_provider(
        &self,
        api_key: impl Into<String>,
    ) -> Result<OpenRouterProvider, ProviderError> {
        let client = OpenRouterClient::with_timeout(
            api_key,
            "https://github.com/coachgen",
            "coachgen",
            self.timeout,
        )?;
        Ok(OpenRouterProvider::new(client, self.model.clone())
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
            .with_response_healing(self.response_healing))
    }

    /// Build a generator around the OpenRouter provider.
    pub fn build_generator(
        &self,
        api_key: impl Into<String>,
    ) -> Result<RoutineGenerator, ProviderError> {
        let provider = self.build_provider(api_key)?;
        Ok(self.apply(RoutineGenerator::new(provider)))
    }

    /// Apply the flow-level settings to an existing generator.
    pub fn apply(&self, generator: RoutineGenerator) -> RoutineGenerator {
        generator
            .with_image_base(self.image_base.clone())
            .with_strict_image_urls(self.strict_image_urls)
    }
}

/// Read the API key from [`API_KEY_ENV`].
pub fn api_key_from_env() -> Result<String, String> {
    std::env::var(API_KEY_ENV).map_err(|_| format!("{API_KEY_ENV} environment variable is not set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, 4096);
        assert!((config.temperature - 0.4).abs() < f32::EPSILON);
        assert_eq!(config.image_base, "https://picsum.photos");
        assert!(!config.strict_image_urls);
        assert!(config.response_healing);
    }

    #[test]
    fn builders_override() {
        let config = GeneratorConfig::default()
            .with_model("anthropic/claude-sonnet-4")
            .with_max_tokens(1000)
            .with_strict_image_urls(true);
        assert_eq!(config.model, "anthropic/claude-sonnet-4");
        assert_eq!(config.max_tokens, 1000);
        assert!(config.strict_image_urls);
    }

    #[test]
    fn build_generator_uses_model_as_provider_name() {
        let config = GeneratorConfig::default().with_model("test/model");
        let generator = config.build_generator("key").unwrap();
        assert_eq!(generator.provider_name(), "test/model");
        assert!(!generator.is_strict());
    }
}
