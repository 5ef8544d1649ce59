//! Convenience re-exports for common `coachgen` types.
//!
//! ```ignore
//! use coachgen::prelude::*;
//! ```

pub use crate::config::{GeneratorConfig, api_key_from_env};
pub use crate::error::{GenerationError, ProviderError};
pub use crate::flow::{Generation, ImageUrlWarning, RoutineGenerator};
pub use crate::form::{ProfileForm, display_error, render_summary};
pub use crate::profile::{Sex, UserProfile};
pub use crate::prompt::render_prompt;
pub use crate::provider::{FnProvider, OpenRouterProvider, RoutineProvider};
pub use crate::routine::{Exercise, GenerationResult, ImagePhase, image_url, slugify};
pub use crate::schema::{SchemaValidator, Violation, output_json_schema};
pub use crate::{Message, OpenRouterClient, json_schema_for};
