//! The routine-generation prompt.
//!
//! [`render_prompt`] turns a validated [`UserProfile`] into the instruction
//! document sent to the provider. It is plain substitution into a fixed
//! structure: the same profile always renders the same bytes. Nothing here
//! checks that the provider follows the instructions; the flow re-validates
//! whatever comes back.

use crate::profile::UserProfile;
use crate::routine::{IMAGE_SIZE, ImagePhase, MIN_NOTES_CHARS, image_prefix};

/// Sentence the notes must end with.
pub const DISCLAIMER: &str = "Always consult with a healthcare professional before starting any new \
exercise program, especially if you have pre-existing health conditions.";

const PERSONA: &str = "\
You are an expert personal trainer and kinesiologist who designs safe, effective and \
highly personalized workout routines. Safety comes first: weigh every health condition \
and sports goal below against the reference documentation before choosing anything.";

/// Builder for multi-section markdown prompts.
///
/// Sections are joined with blank lines. Empty sections are skipped.
///
/// ```
/// use coachgen::prompt::PromptBuilder;
///
/// let prompt = PromptBuilder::new("You are a trainer.")
///     .section("Profile", "Age: 30")
///     .section("Empty", "")
///     .build();
///
/// assert_eq!(prompt, "You are a trainer.\n\n## Profile\n\nAge: 30");
/// ```
pub struct PromptBuilder {
    sections: Vec<String>,
}

impl PromptBuilder {
    /// Start with a preamble that gets no heading.
    pub fn new(preamble: impl Into<String>) -> Self {
        Self {
            sections: vec![preamble.into()],
        }
    }

    /// Append a headed section. Skipped if `content` is empty.
    pub fn section(mut self, heading: &str, content: impl Into<String>) -> Self {
        let content = content.into();
        if !content.is_empty() {
            self.sections.push(format!("## {heading}\n\n{content}"));
        }
        self
    }

    pub fn build(self) -> String {
        self.sections.join("\n\n")
    }
}

/// Render the full prompt for `profile`, with exercise images addressed
/// under `image_base`.
pub fn render_prompt(profile: &UserProfile, image_base: &str) -> String {
    PromptBuilder::new(PERSONA)
        .section("User Profile", profile_block(profile))
        .section(
            "Reference Documentation",
            format!(
                "Use this material for guidance on conditions:\n\n```\n{}\n```",
                profile.documentation
            ),
        )
        .section(
            "Task",
            "Produce a personalized workout routine and comprehensive notes based strictly \
             on the profile and the reference documentation. Safety outranks every other goal.",
        )
        .section("Routine Procedure", routine_steps(image_base))
        .section("Notes Requirements", notes_requirements())
        .section(
            "Output",
            "Return only a JSON object matching the provided output schema: a `workoutRoutine` \
             array (empty when no safe routine exists) and a `notes` string. Double-check JSON \
             validity, the image URL format, and that the notes cover every requirement above.",
        )
        .build()
}

fn profile_block(p: &UserProfile) -> String {
    format!(
        "- Sex: {}\n\
         - Age: {}\n\
         - Height: {} cm\n\
         - Weight: {} kg\n\
         - Primary fitness goal: {}\n\
         - Health conditions: {}\n\
         - Sports and goals: {}",
        p.sex,
        p.age,
        p.height_cm,
        p.weight_kg,
        p.fitness_goal,
        p.health_conditions,
        p.sports_activities,
    )
}

fn routine_steps(image_base: &str) -> String {
    let prefix = image_prefix(image_base);
    let (w, h) = IMAGE_SIZE;
    let concentric = ImagePhase::Concentric.as_str();
    let eccentric = ImagePhase::Eccentric.as_str();
    format!(
        "1. **Analyze.** Cross-check the profile against the documentation. Collect every \
guideline, contraindication and modification implied by age, goal, health conditions \
(scoliosis, heart conditions, breathing problems, flat feet, kyphosis and so on) and sports goals.
2. **Decide on safety.** If the documentation calls for medical clearance that the user has not \
stated, or several severe conditions combine into an unacceptable risk, return an EMPTY \
`workoutRoutine`. The notes must then name the conditions and guidance responsible and strongly \
recommend that the user consult a healthcare professional before any exercise.
3. **Structure.** When a routine is safe, pick a balanced split (full body 2-3x per week, \
upper/lower, ...) suited to the goal and a plausible fitness level.
4. **Select exercises.** Choose, modify or avoid exercises explicitly according to the documented \
protocols for each stated health condition. Kyphosis: favour rows, face pulls and chest stretches; \
avoid forward-rounding movements. Heart conditions: start with low-intensity steady-state work and \
avoid the Valsalva maneuver.
5. **Sets and reps.** Assign 2-4 sets and reps matched to the goal: 8-12 for hypertrophy, 12-15+ \
for endurance, time-based such as \"30 seconds\" for isometric holds. Apply condition modifications.
6. **Muscle groups.** List the primary muscles each exercise trains, e.g. \
[\"Quadriceps\", \"Glutes\", \"Hamstrings\"] for squats.
7. **Images.** For every exercise give exactly two {w}x{h} placeholder URLs:
   - `concentricImage`: `{prefix}{{slug}}-{concentric}/{w}/{h}`
   - `eccentricImage`: `{prefix}{{slug}}-{eccentric}/{w}/{h}`
   where `{{slug}}` is the exercise name lowercased, with every run of characters other than \
letters and digits replaced by a single hyphen (\"Dumbbell Bench Press\" -> \
`dumbbell-bench-press`)."
    )
}

fn notes_requirements() -> String {
    format!(
        "Always provide notes of at least {MIN_NOTES_CHARS} characters, separating points and \
sections with markdown newlines (\\n). Cover:

- **General advice:** concrete warm-up (e.g. 5 minutes of brisk walking plus arm and leg swings) \
and cool-down (e.g. 30-second hamstring and quad stretches); hydration, rest and sleep; telling \
normal soreness apart from pain.
- **Safety:** explicit advice and modifications for EACH stated health condition, tied to the \
documentation, including combined risks. If `workoutRoutine` is empty, explain exactly why and \
strongly advise the user to consult a professional before exercising.
- **Form cues:** short cues for one or two fundamental exercises in the routine, e.g. \"keep your \
chest up and back straight during squats\".
- **Progression:** the principle of progressive overload with an example from this routine.
- **Sports:** when sports are listed, how the routine supports performance or avoids interfering \
with it, according to the stated goal.
- **Disclaimer:** include this sentence verbatim: \"{DISCLAIMER}\""
    )
}
