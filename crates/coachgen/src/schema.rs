//! JSON Schema validation at both ends of the provider call.
//!
//! A [`SchemaValidator<T>`] compiles the schema `schemars` derives for `T`
//! once and checks untrusted `serde_json::Value` candidates against it in
//! three stages:
//!
//! 1. **Shape**: the compiled JSON Schema (required fields, types, closed
//!    enums, integer minimums, string minimum lengths).
//! 2. **Typing**: `serde_json::from_value` into `T`.
//! 3. **Constraints**: [`Constraints::violations`] for rules JSON Schema
//!    cannot state exactly (strictly-positive floats, URL syntax).
//!
//! The first stage that reports anything wins; later stages never run on a
//! candidate that already failed.

use std::fmt;
use std::marker::PhantomData;

use schemars::JsonSchema;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_path_to_error::{Path, Segment};
use serde_json::Value;
use tracing::{trace, warn};

use crate::json_schema_for;
use crate::routine::GenerationResult;

/// Root path used when a violation is not tied to a single field.
pub const ROOT_FIELD: &str = "$";

/// One failed constraint: which field, and what it had to satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Dotted path to the offending field (`age`, `workoutRoutine.0.sets`),
    /// or `$` for the whole document.
    pub field: String,
    /// Human-readable description of the violated constraint.
    pub constraint: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            constraint: constraint.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.constraint)
    }
}

/// The output schema sent to the provider alongside the prompt.
pub fn output_json_schema() -> Value {
    json_schema_for::<GenerationResult>()
}

/// Value-level rules checked after a candidate has been deserialized.
pub trait Constraints {
    /// Every rule this value breaks. Empty means valid.
    fn violations(&self) -> Vec<Violation>;
}

/// Compiled validator for one schema type.
pub struct SchemaValidator<T> {
    schema: Value,
    validator: Option<jsonschema::Validator>,
    _target: PhantomData<fn() -> T>,
}

impl<T> SchemaValidator<T>
where
    T: JsonSchema + DeserializeOwned + Constraints,
{
    /// Derive and compile the schema for `T`.
    ///
    /// A schema that fails to compile is logged and skipped; typed
    /// deserialization and [`Constraints`] still guard the value.
    pub fn new() -> Self {
        let schema = json_schema_for::<T>();
        let validator = match jsonschema::validator_for(&schema) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("schema for {} failed to compile: {e}", T::schema_name());
                None
            }
        };
        Self {
            schema,
            validator,
            _target: PhantomData,
        }
    }

    /// The JSON Schema document for `T`.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Check `candidate` and produce the typed value.
    pub fn validate(&self, candidate: &Value) -> Result<T, Vec<Violation>> {
        if let Some(validator) = &self.validator {
            let shape: Vec<Violation> = validator
                .iter_errors(candidate)
                .map(|e| {
                    let message = e.to_string();
                    let field = field_from_pointer(&e.instance_path().to_string(), &message);
                    Violation::new(field, message)
                })
                .collect();
            if !shape.is_empty() {
                trace!("{} shape violations: {shape:?}", T::schema_name());
                return Err(shape);
            }
        }

        let value: T = serde_path_to_error::deserialize(candidate).map_err(|e| {
            let field = field_from_path(e.path());
            vec![Violation::new(field, e.into_inner().to_string())]
        })?;

        let violations = value.violations();
        if violations.is_empty() {
            Ok(value)
        } else {
            Err(violations)
        }
    }
}

impl<T> Default for SchemaValidator<T>
where
    T: JsonSchema + DeserializeOwned + Constraints,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SchemaValidator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("compiled", &self.validator.is_some())
            .finish()
    }
}

/// Turn a JSON pointer (`/workoutRoutine/0/sets`) into a dotted field path.
///
/// Missing-property errors are reported against the parent object, so the
/// property name is pulled out of the message instead.
fn field_from_pointer(pointer: &str, message: &str) -> String {
    let mut segments: Vec<String> = pointer
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect();

    if let Some(missing) = required_property(message) {
        segments.push(missing);
    }

    if segments.is_empty() {
        ROOT_FIELD.to_string()
    } else {
        segments.join(".")
    }
}

/// Dotted field path for an error raised while deserializing into `T`.
fn field_from_path(path: &Path) -> String {
    let segments: Vec<String> = path
        .iter()
        .filter_map(|segment| match segment {
            Segment::Seq { index } => Some(index.to_string()),
            Segment::Map { key } => Some(key.clone()),
            Segment::Enum { variant } => Some(variant.clone()),
            _ => None,
        })
        .collect();
    if segments.is_empty() {
        ROOT_FIELD.to_string()
    } else {
        segments.join(".")
    }
}

/// Deserialize a whole number into `u32`, accepting integral floats such
/// as `30.0`. JSON Schema counts those as integers, so the typed stage
/// must agree.
pub fn integral_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let n = serde_json::Number::deserialize(deserializer)?;
    let whole = n.as_u64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(f))
            .map(|f| f as u64)
    });
    whole
        .and_then(|w| u32::try_from(w).ok())
        .ok_or_else(|| de::Error::custom(format!("{n} is not a whole number in 0..={}", u32::MAX)))
}

fn required_property(message: &str) -> Option<String> {
    let rest = message.strip_suffix(" is a required property")?;
    let name = rest.strip_prefix('"')?.strip_suffix('"')?;
    Some(name.to_string())
}
