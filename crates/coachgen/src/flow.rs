//! The generation flow.
//!
//! ```text
//! candidate ──▶ input schema ──▶ prompt ──▶ provider ──▶ output schema
//!                   │                          │              │
//!             InvalidInput                  Provider     InvalidOutput
//!
//!           ──▶ empty routine needs "consult" ──▶ image URL prefix check ──▶ Generation
//!                          │                              │
//!               MissingSafetyAdvisory           warning (or ImageUrlFormat when strict)
//! ```
//!
//! Each call is independent: one provider call, no retries, no caching, no
//! shared mutable state. Identical input may produce different routines
//! because the provider is non-deterministic.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use serde::Serialize;
use serde_json::Value;
use tracing::{Instrument, info, info_span, warn};

use crate::error::GenerationError;
use crate::profile::UserProfile;
use crate::prompt::render_prompt;
use crate::provider::RoutineProvider;
use crate::routine::{DEFAULT_IMAGE_BASE, GenerationResult, ImagePhase, image_prefix};
use crate::schema::{ROOT_FIELD, SchemaValidator, Violation};

/// Non-fatal: an exercise image URL does not start with the expected prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageUrlWarning {
    pub exercise: String,
    pub phase: ImagePhase,
    pub url: String,
}

impl fmt::Display for ImageUrlWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid {} image URL format for {}: {}",
            self.phase.as_str(),
            self.exercise,
            self.url
        )
    }
}

/// A validated routine and what was noticed while checking it.
#[derive(Debug, Clone)]
pub struct Generation {
    /// The provider's output, unchanged.
    pub result: GenerationResult,
    /// Image URL mismatches (soft mode only).
    pub warnings: Vec<ImageUrlWarning>,
    /// Correlation ID recorded on this call's log span.
    pub trace_id: String,
}

/// Generate a unique trace ID for one generation call.
pub fn generate_trace_id() -> String {
    let ts = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("tr-{ts:x}-{count:04x}")
}

/// Orchestrates validation around a single provider call.
///
/// Holds no per-call state, so one instance can serve concurrent callers.
/// Nothing here serializes or deduplicates those calls.
pub struct RoutineGenerator {
    provider: Box<dyn RoutineProvider>,
    input: SchemaValidator<UserProfile>,
    output: SchemaValidator<GenerationResult>,
    image_base: String,
    strict_image_urls: bool,
}

impl RoutineGenerator {
    pub fn new(provider: impl RoutineProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            input: UserProfile::validator(),
            output: GenerationResult::validator(),
            image_base: DEFAULT_IMAGE_BASE.to_string(),
            strict_image_urls: false,
        }
    }

    /// Image host the prompt asks for and the prefix check expects.
    pub fn with_image_base(mut self, base: impl Into<String>) -> Self {
        self.image_base = base.into();
        self
    }

    /// Turn image URL warnings into [`GenerationError::ImageUrlFormat`].
    pub fn with_strict_image_urls(mut self, strict: bool) -> Self {
        self.strict_image_urls = strict;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn is_strict(&self) -> bool {
        self.strict_image_urls
    }

    /// The output schema handed to the provider.
    pub fn output_schema(&self) -> &Value {
        self.output.schema()
    }

    /// Step 1 on its own: check a raw candidate profile.
    pub fn validate_input(&self, candidate: &Value) -> Result<UserProfile, GenerationError> {
        self.input.validate(candidate).map_err(GenerationError::InvalidInput)
    }

    /// The prompt this generator would send for `profile`.
    pub fn prompt_for(&self, profile: &UserProfile) -> String {
        render_prompt(profile, &self.image_base)
    }

    /// Run the whole flow on a raw candidate profile.
    pub async fn generate(&self, candidate: &Value) -> Result<Generation, GenerationError> {
        let trace_id = generate_trace_id();
        let span = info_span!("generate", trace_id = %trace_id, provider = self.provider.name());
        async {
            let profile = self.validate_input(candidate).inspect_err(|e| {
                info!("rejected input before provider call: {e}");
            })?;
            self.run(&profile, trace_id.clone()).await
        }
        .instrument(span)
        .await
    }

    /// Run the flow for a profile already in typed form. It is re-validated
    /// all the same.
    pub async fn generate_profile(
        &self,
        profile: &UserProfile,
    ) -> Result<Generation, GenerationError> {
        let candidate = serde_json::to_value(profile).map_err(|e| {
            GenerationError::InvalidInput(vec![Violation::new(ROOT_FIELD, e.to_string())])
        })?;
        self.generate(&candidate).await
    }

    async fn run(
        &self,
        profile: &UserProfile,
        trace_id: String,
    ) -> Result<Generation, GenerationError> {
        let prompt = self.prompt_for(profile);
        info!("requesting routine ({} byte prompt)", prompt.len());

        let candidate = self
            .provider
            .generate(&prompt, self.output.schema())
            .await
            .inspect_err(|e| warn!("provider failed: {e}"))?;

        let (result, warnings) = self.check_output(&candidate)?;
        info!(
            "routine accepted: {} exercise(s), {} warning(s)",
            result.workout_routine.len(),
            warnings.len()
        );
        Ok(Generation {
            result,
            warnings,
            trace_id,
        })
    }

    /// Steps 3-5 on their own: validate a provider candidate and run the
    /// post-hoc checks.
    pub fn check_output(
        &self,
        candidate: &Value,
    ) -> Result<(GenerationResult, Vec<ImageUrlWarning>), GenerationError> {
        let result = self.output.validate(candidate).map_err(|violations| {
            warn!("provider output failed validation: {violations:?}");
            GenerationError::InvalidOutput(violations)
        })?;

        if result.workout_routine.is_empty() && !result.has_safety_advisory() {
            warn!(
                "empty routine without a consultation recommendation: {}",
                result.notes
            );
            return Err(GenerationError::MissingSafetyAdvisory);
        }

        let warnings = self.image_url_warnings(&result);
        if self.strict_image_urls
            && let Some(first) = warnings.first()
        {
            warn!("{first}");
            return Err(GenerationError::ImageUrlFormat {
                exercise: first.exercise.clone(),
                url: first.url.clone(),
            });
        }
        for w in &warnings {
            warn!("{w}");
        }
        Ok((result, warnings))
    }

    fn image_url_warnings(&self, result: &GenerationResult) -> Vec<ImageUrlWarning> {
        let prefix = image_prefix(&self.image_base);
        result
            .workout_routine
            .iter()
            .flat_map(|ex| {
                [ImagePhase::Concentric, ImagePhase::Eccentric]
                    .into_iter()
                    .filter(|phase| !ex.image(*phase).starts_with(&prefix))
                    .map(|phase| ImageUrlWarning {
                        exercise: ex.name.clone(),
                        phase,
                        url: ex.image(phase).to_string(),
                    })
            })
            .collect()
    }
}

impl fmt::Debug for RoutineGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutineGenerator")
            .field("provider", &self.provider.name())
            .field("image_base", &self.image_base)
            .field("strict_image_urls", &self.strict_image_urls)
            .finish()
    }
}
