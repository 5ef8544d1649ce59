//! The user profile submitted for routine generation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::schema::{Constraints, SchemaValidator, Violation, integral_u32};

/// Sentinel for free-text fields the user left empty.
pub const NONE_SENTINEL: &str = "None";

/// Biological sex as collected by the form. Closed set.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated profile. Built once per submission and never mutated.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// The user's sex.
    pub sex: Sex,
    /// The user's age in years.
    #[schemars(range(min = 1))]
    #[serde(deserialize_with = "integral_u32")]
    pub age: u32,
    /// The user's height in centimeters.
    pub height_cm: f64,
    /// The user's weight in kilograms.
    pub weight_kg: f64,
    /// Primary fitness goal (e.g. weight loss, muscle gain, general fitness).
    pub fitness_goal: String,
    /// Health conditions, or "None".
    pub health_conditions: String,
    /// Sports practiced and the goal for each, or "None".
    pub sports_activities: String,
    /// Reference medical and fitness documentation.
    pub documentation: String,
}

impl UserProfile {
    /// Validator for raw candidate profiles.
    pub fn validator() -> SchemaValidator<UserProfile> {
        SchemaValidator::new()
    }
}

impl Constraints for UserProfile {
    fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();
        if self.age == 0 {
            out.push(Violation::new("age", "must be a positive integer"));
        }
        if !is_positive(self.height_cm) {
            out.push(Violation::new("heightCm", "must be a positive number"));
        }
        if !is_positive(self.weight_kg) {
            out.push(Violation::new("weightKg", "must be a positive number"));
        }
        out
    }
}

fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}
