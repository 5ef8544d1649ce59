//! Generated routines: the output schema and its image URL convention.
//!
//! Exercise illustrations are placeholder images addressed by a deterministic
//! URL, `{base}/seed/{slug}-{phase}/300/200`, where `slug` is derived from
//! the exercise name by [`slugify`]. The provider is asked to produce these
//! URLs itself; the flow only checks their prefix afterwards.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::schema::{Constraints, SchemaValidator, Violation, integral_u32};

/// Default placeholder image host.
pub const DEFAULT_IMAGE_BASE: &str = "https://picsum.photos";

/// Placeholder image dimensions (width/height).
pub const IMAGE_SIZE: (u32, u32) = (300, 200);

/// Minimum length of the notes, in characters.
pub const MIN_NOTES_CHARS: usize = 50;

/// Substring (case-insensitive) that marks a recommendation to consult a
/// professional.
pub const SAFETY_ADVISORY_MARKER: &str = "consult";

/// Movement phase an exercise image illustrates.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImagePhase {
    Concentric,
    Eccentric,
}

impl ImagePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImagePhase::Concentric => "concentric",
            ImagePhase::Eccentric => "eccentric",
        }
    }
}

/// One exercise in a generated routine.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    /// The name of the exercise.
    pub name: String,
    /// The number of sets to perform.
    #[schemars(range(min = 1))]
    #[serde(deserialize_with = "integral_u32")]
    pub sets: u32,
    /// Repetitions per set, e.g. "8-12", "15", "AMRAP", "30 seconds".
    pub reps: String,
    /// Primary muscle groups targeted by the exercise.
    pub muscle_groups: Vec<String>,
    /// Concentric phase image: https://picsum.photos/seed/{slug}-concentric/300/200
    pub concentric_image: String,
    /// Eccentric phase image: https://picsum.photos/seed/{slug}-eccentric/300/200
    pub eccentric_image: String,
}

impl Exercise {
    /// The image URL for `phase`.
    pub fn image(&self, phase: ImagePhase) -> &str {
        match phase {
            ImagePhase::Concentric => &self.concentric_image,
            ImagePhase::Eccentric => &self.eccentric_image,
        }
    }

    fn violations_at(&self, index: usize) -> Vec<Violation> {
        let mut out = Vec::new();
        if self.sets == 0 {
            out.push(Violation::new(
                format!("workoutRoutine.{index}.sets"),
                "must be a positive integer",
            ));
        }
        for (field, url) in [
            ("concentricImage", &self.concentric_image),
            ("eccentricImage", &self.eccentric_image),
        ] {
            if reqwest::Url::parse(url).is_err() {
                out.push(Violation::new(
                    format!("workoutRoutine.{index}.{field}"),
                    "must be a valid URL",
                ));
            }
        }
        out
    }
}

/// A routine plus the notes that accompany it.
///
/// An empty `workout_routine` is a legitimate answer: it means the provider
/// judged exercise unsafe for this profile, and the notes must then say so.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    /// The generated workout routine. Empty if no safe routine is possible,
    /// in which case the notes explain why and advise professional consultation.
    pub workout_routine: Vec<Exercise>,
    /// General advice, condition-specific safety guidance, form cues,
    /// progression and sports guidance, and a disclaimer. Markdown newlines.
    #[schemars(length(min = 50))]
    pub notes: String,
}

impl GenerationResult {
    /// Validator for raw provider output.
    pub fn validator() -> SchemaValidator<GenerationResult> {
        SchemaValidator::new()
    }

    /// Whether the notes recommend consulting a professional.
    pub fn has_safety_advisory(&self) -> bool {
        self.notes.to_lowercase().contains(SAFETY_ADVISORY_MARKER)
    }
}

impl Constraints for GenerationResult {
    fn violations(&self) -> Vec<Violation> {
        let mut out: Vec<Violation> = self
            .workout_routine
            .iter()
            .enumerate()
            .flat_map(|(i, ex)| ex.violations_at(i))
            .collect();
        if self.notes.chars().count() < MIN_NOTES_CHARS {
            out.push(Violation::new(
                "notes",
                format!("must be at least {MIN_NOTES_CHARS} characters"),
            ));
        }
        out
    }
}

/// URL-safe slug: lowercase ASCII alphanumerics, every other run of
/// characters collapsed to a single hyphen, no leading/trailing hyphens.
///
/// ```
/// use coachgen::routine::slugify;
///
/// assert_eq!(slugify("Dumbbell Bench Press"), "dumbbell-bench-press");
/// assert_eq!(slugify("Push-Up (Knees)"), "push-up-knees");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Prefix every exercise image URL must start with.
pub fn image_prefix(base: &str) -> String {
    format!("{}/seed/", base.trim_end_matches('/'))
}

/// The placeholder image URL for an exercise name and phase.
pub fn image_url(base: &str, exercise_name: &str, phase: ImagePhase) -> String {
    let (w, h) = IMAGE_SIZE;
    format!(
        "{}{}-{}/{w}/{h}",
        image_prefix(base),
        slugify(exercise_name),
        phase.as_str()
    )
}
