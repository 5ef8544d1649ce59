//! Raw form input and the user-facing side of the flow.
//!
//! Front-ends collect every field as text. [`ProfileForm::to_candidate`]
//! turns that into a candidate profile without judging it: numbers that do
//! not parse become `null` so the input schema names the field, and empty
//! optional fields get their sentinels. The flow decides what is valid.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::GenerationError;
use crate::profile::NONE_SENTINEL;
use crate::routine::GenerationResult;

/// Placeholder sent when the user pastes no documentation.
pub const NO_DOCUMENTATION: &str = "No documentation provided.";

/// The only message shown to users when generation fails.
pub const GENERIC_ERROR: &str =
    "Could not generate your routine. Please check your details and try again.";

/// Every field of the profile form, as entered.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileForm {
    pub sex: String,
    pub age: String,
    pub height_cm: String,
    pub weight_kg: String,
    pub fitness_goal: String,
    pub health_conditions: String,
    pub sports_activities: String,
    pub documentation: String,
}

impl ProfileForm {
    /// Build the candidate profile JSON for the flow.
    pub fn to_candidate(&self) -> Value {
        json!({
            "sex": self.sex.trim().to_lowercase(),
            "age": parse_number(&self.age),
            "heightCm": parse_number(&self.height_cm),
            "weightKg": parse_number(&self.weight_kg),
            "fitnessGoal": self.fitness_goal.trim(),
            "healthConditions": or_default(&self.health_conditions, NONE_SENTINEL),
            "sportsActivities": or_default(&self.sports_activities, NONE_SENTINEL),
            "documentation": or_default(&self.documentation, NO_DOCUMENTATION),
        })
    }
}

/// Whole numbers become integers (`"30.0"` too) so the schema can tell
/// `30` from `30.5`.
fn parse_number(raw: &str) -> Value {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return json!(n);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => json!(f as i64),
        Ok(f) if f.is_finite() => json!(f),
        _ => Value::Null,
    }
}

fn or_default(raw: &str, default: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

/// The message a front-end shows for any failure. Details belong in logs.
pub fn display_error(_error: &GenerationError) -> &'static str {
    GENERIC_ERROR
}

/// Plain-text rendering of a routine, as the result view lays it out.
pub fn render_summary(result: &GenerationResult) -> String {
    let mut out = String::from("Generated routine:\n");
    if result.workout_routine.is_empty() {
        out.push_str("\nNo exercise routine was generated.\n");
    } else {
        for ex in &result.workout_routine {
            out.push_str(&format!(
                "\n{}\n  Sets: {}\n  Reps: {}\n  Muscle groups: {}\n",
                ex.name,
                ex.sets,
                ex.reps,
                ex.muscle_groups.join(", ")
            ));
        }
    }
    out.push_str("\nNotes:\n");
    out.push_str(&result.notes);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routine::Exercise;

    fn filled() -> ProfileForm {
        ProfileForm {
            sex: "Male".into(),
            age: " 30 ".into(),
            height_cm: "180.5".into(),
            weight_kg: "80".into(),
            fitness_goal: "muscle gain".into(),
            health_conditions: "".into(),
            sports_activities: "  ".into(),
            documentation: String::new(),
        }
    }

    #[test]
    fn candidate_conversion() {
        let c = filled().to_candidate();
        assert_eq!(c["sex"], "male");
        assert_eq!(c["age"], json!(30));
        assert_eq!(c["heightCm"], json!(180.5));
        assert_eq!(c["weightKg"], json!(80));
        assert_eq!(c["healthConditions"], NONE_SENTINEL);
        assert_eq!(c["sportsActivities"], NONE_SENTINEL);
        assert_eq!(c["documentation"], NO_DOCUMENTATION);
    }

    #[test]
    fn integral_decimals_become_integers() {
        let form = ProfileForm {
            age: "30.0".into(),
            weight_kg: "80.00".into(),
            ..filled()
        };
        let c = form.to_candidate();
        assert_eq!(c["age"], json!(30));
        assert!(c["age"].is_i64());
        assert_eq!(c["weightKg"], json!(80));
    }

    #[test]
    fn unparseable_numbers_become_null() {
        let form = ProfileForm {
            age: "thirty".into(),
            height_cm: "".into(),
            weight_kg: "NaN".into(),
            ..filled()
        };
        let c = form.to_candidate();
        assert!(c["age"].is_null());
        assert!(c["heightCm"].is_null());
        assert!(c["weightKg"].is_null());
    }

    #[test]
    fn form_deserializes_with_missing_fields() {
        let form: ProfileForm =
            serde_json::from_str(r#"{"age": "25", "heightCm": "170"}"#).unwrap();
        assert_eq!(form.age, "25");
        assert_eq!(form.height_cm, "170");
        assert!(form.sex.is_empty());
    }

    #[test]
    fn every_error_gets_the_generic_message() {
        for err in [
            GenerationError::MissingSafetyAdvisory,
            GenerationError::InvalidInput(vec![]),
        ] {
            assert_eq!(display_error(&err), GENERIC_ERROR);
        }
    }

    #[test]
    fn summary_lists_exercises_then_notes() {
        let result = GenerationResult {
            workout_routine: vec![Exercise {
                name: "Goblet Squat".into(),
                sets: 3,
                reps: "10-12".into(),
                muscle_groups: vec!["Quadriceps".into(), "Glutes".into()],
                concentric_image: String::new(),
                eccentric_image: String::new(),
            }],
            notes: "Keep your chest up.".into(),
        };
        let text = render_summary(&result);
        assert!(
            text.contains("Goblet Squat\n  Sets: 3\n  Reps: 10-12\n  Muscle groups: Quadriceps, Glutes")
        );
        assert!(text.ends_with("Notes:\nKeep your chest up.\n"));
    }

    #[test]
    fn summary_for_empty_routine() {
        let result = GenerationResult {
            workout_routine: vec![],
            notes: "Please consult your doctor.".into(),
        };
        assert!(render_summary(&result).contains("No exercise routine was generated."));
    }
}
