//! End-to-end tests for the generation flow with stubbed providers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use coachgen::prelude::*;
use coachgen::routine::{DEFAULT_IMAGE_BASE, image_url};
use serde_json::{Value, json};

fn scenario_a_input() -> Value {
    json!({
        "sex": "male",
        "age": 30,
        "heightCm": 180,
        "weightKg": 80,
        "fitnessGoal": "muscle gain",
        "healthConditions": "None",
        "sportsActivities": "None",
        "documentation": "Hypertrophy: 8-12 reps, 3-4 sets, progressive overload."
    })
}

fn exercise(name: &str, sets: u32, reps: &str, muscles: &[&str]) -> Value {
    json!({
        "name": name,
        "sets": sets,
        "reps": reps,
        "muscleGroups": muscles,
        "concentricImage": image_url(DEFAULT_IMAGE_BASE, name, ImagePhase::Concentric),
        "eccentricImage": image_url(DEFAULT_IMAGE_BASE, name, ImagePhase::Eccentric),
    })
}

/// Sixty-odd words of advice, none of which recommends seeing a professional.
fn long_notes() -> String {
    let words = "Warm up with five minutes of brisk walking then swing arms and legs gently. \
        Rest ninety seconds between sets and drink water throughout the session. Keep your chest up \
        and back straight during squats and rows. Add weight once every set reaches twelve clean \
        repetitions. Sleep well, eat enough protein, and stop immediately if sharp pain appears. \
        Track each workout so progress stays visible and steady every single week.";
    assert!(words.split_whitespace().count() >= 60);
    assert!(!words.to_lowercase().contains("consult"));
    words.to_string()
}

fn five_exercise_output() -> Value {
    json!({
        "workoutRoutine": [
            exercise("Barbell Back Squat", 4, "8-12", &["Quadriceps", "Glutes", "Hamstrings"]),
            exercise("Dumbbell Bench Press", 3, "8-12", &["Chest", "Triceps", "Front Deltoids"]),
            exercise("Seated Cable Row", 3, "10-12", &["Lats", "Rhomboids", "Biceps"]),
            exercise("Romanian Deadlift", 3, "8-10", &["Hamstrings", "Glutes", "Lower Back"]),
            exercise("Plank", 3, "45 seconds", &["Core"]),
        ],
        "notes": long_notes(),
    })
}

/// Provider that counts calls and always answers with `output`.
fn counting_provider(output: Value) -> (FnProvider, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let provider = FnProvider::new(move |_prompt: String| {
        seen.fetch_add(1, Ordering::SeqCst);
        let output = output.clone();
        async move { Ok(output) }
    });
    (provider, calls)
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn scenario_a_valid_routine_returned_unchanged() {
    let output = five_exercise_output();
    let (provider, calls) = counting_provider(output.clone());
    let generator = RoutineGenerator::new(provider);

    let generation = generator.generate(&scenario_a_input()).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(generation.result.workout_routine.len(), 5);
    assert!(generation.warnings.is_empty());
    assert!(generation.trace_id.starts_with("tr-"));
    assert_eq!(serde_json::to_value(&generation.result).unwrap(), output);
}

#[tokio::test]
async fn scenario_b_empty_routine_without_advisory_fails() {
    // "Not safe to exercise." alone is under the notes minimum, so it is padded
    // to isolate the advisory check.
    let output = json!({
        "workoutRoutine": [],
        "notes": "Not safe to exercise. Your stated heart condition requires clearance first."
    });
    let generator = RoutineGenerator::new(FnProvider::returning(output));
    let err = generator.generate(&scenario_a_input()).await.unwrap_err();
    assert!(matches!(err, GenerationError::MissingSafetyAdvisory), "{err:?}");
}

#[tokio::test]
async fn scenario_b_short_notes_fail_as_invalid_output() {
    let output = json!({ "workoutRoutine": [], "notes": "Not safe to exercise." });
    let generator = RoutineGenerator::new(FnProvider::returning(output));
    let err = generator.generate(&scenario_a_input()).await.unwrap_err();
    assert!(matches!(err, GenerationError::InvalidOutput(_)), "{err:?}");
    assert_eq!(err.violations()[0].field, "notes");
}

#[tokio::test]
async fn scenario_c_wrong_image_url_warns_but_succeeds() {
    let mut output = five_exercise_output();
    output["workoutRoutine"][0]["concentricImage"] = json!("http://wrong.com/img.png");
    let generator = RoutineGenerator::new(FnProvider::returning(output.clone()));

    let generation = generator.generate(&scenario_a_input()).await.unwrap();

    assert_eq!(generation.warnings.len(), 1);
    let warning = &generation.warnings[0];
    assert_eq!(warning.exercise, "Barbell Back Squat");
    assert_eq!(warning.phase, ImagePhase::Concentric);
    assert_eq!(warning.url, "http://wrong.com/img.png");
    assert_eq!(serde_json::to_value(&generation.result).unwrap(), output);
}

#[tokio::test]
async fn scenario_d_negative_age_rejected_before_provider_call() {
    let mut input = scenario_a_input();
    input["age"] = json!(-5);
    let (provider, calls) = counting_provider(five_exercise_output());
    let generator = RoutineGenerator::new(provider);

    let err = generator.generate(&input).await.unwrap_err();

    assert!(matches!(err, GenerationError::InvalidInput(_)), "{err:?}");
    assert!(err.violations().iter().any(|v| v.field == "age"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// ── Failure taxonomy ────────────────────────────────────────────────

#[tokio::test]
async fn provider_failure_is_terminal() {
    let generator = RoutineGenerator::new(FnProvider::failing("connection reset"));
    let err = generator.generate(&scenario_a_input()).await.unwrap_err();
    match err {
        GenerationError::Provider(inner) => assert_eq!(inner.to_string(), "connection reset"),
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn provider_is_called_exactly_once_even_on_bad_output() {
    let (provider, calls) = counting_provider(json!({ "notes": 42 }));
    let generator = RoutineGenerator::new(provider);
    let err = generator.generate(&scenario_a_input()).await.unwrap_err();
    assert!(matches!(err, GenerationError::InvalidOutput(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

type Mutation = Box<dyn Fn(&mut Value)>;

fn case(label: &'static str, mutate: impl Fn(&mut Value) + 'static) -> (&'static str, Mutation) {
    (label, Box::new(mutate))
}

#[tokio::test]
async fn output_shape_violations_are_invalid_output() {
    let cases = vec![
        case("missing notes", |v| {
            v.as_object_mut().unwrap().remove("notes");
        }),
        case("missing routine", |v| {
            v.as_object_mut().unwrap().remove("workoutRoutine");
        }),
        case("sets as string", |v| v["workoutRoutine"][0]["sets"] = json!("three")),
        case("zero sets", |v| v["workoutRoutine"][1]["sets"] = json!(0)),
        case("fractional sets", |v| v["workoutRoutine"][1]["sets"] = json!(2.5)),
        case("reps as number", |v| v["workoutRoutine"][2]["reps"] = json!(12)),
        case("muscle groups as string", |v| {
            v["workoutRoutine"][3]["muscleGroups"] = json!("Hamstrings")
        }),
        case("missing image", |v| {
            v["workoutRoutine"][4].as_object_mut().unwrap().remove("eccentricImage");
        }),
        case("image not a url", |v| {
            v["workoutRoutine"][4]["eccentricImage"] = json!("plank eccentric")
        }),
        case("routine not an array", |v| v["workoutRoutine"] = json!({})),
    ];

    for (label, mutate) in cases {
        let mut output = five_exercise_output();
        mutate(&mut output);
        let generator = RoutineGenerator::new(FnProvider::returning(output));
        let err = generator.generate(&scenario_a_input()).await.unwrap_err();
        assert!(
            matches!(err, GenerationError::InvalidOutput(_)),
            "{label}: {err:?}"
        );
    }
}

#[tokio::test]
async fn empty_routine_with_advisory_succeeds_in_any_case() {
    for phrase in ["consult", "Consult", "CONSULTATION", "consulting"] {
        let notes = format!(
            "No routine was generated because of your heart condition. Please {phrase} a cardiologist first."
        );
        let output = json!({ "workoutRoutine": [], "notes": notes });
        let generator = RoutineGenerator::new(FnProvider::returning(output));
        let generation = generator.generate(&scenario_a_input()).await.unwrap();
        assert!(generation.result.workout_routine.is_empty(), "{phrase}");
    }
}

#[tokio::test]
async fn strict_mode_rejects_wrong_image_url() {
    let mut output = five_exercise_output();
    output["workoutRoutine"][2]["eccentricImage"] = json!("https://example.com/row.png");
    let generator =
        RoutineGenerator::new(FnProvider::returning(output)).with_strict_image_urls(true);

    let err = generator.generate(&scenario_a_input()).await.unwrap_err();
    match err {
        GenerationError::ImageUrlFormat { exercise, url } => {
            assert_eq!(exercise, "Seated Cable Row");
            assert_eq!(url, "https://example.com/row.png");
        }
        other => panic!("expected image URL error, got {other:?}"),
    }
}

// ── Properties ──────────────────────────────────────────────────────

#[test]
fn output_validation_is_idempotent() {
    let validator = GenerationResult::validator();
    let first = validator.validate(&five_exercise_output()).unwrap();
    let again = validator
        .validate(&serde_json::to_value(&first).unwrap())
        .unwrap();
    assert_eq!(first, again);
}

#[test]
fn input_validation_accepts_only_valid_profiles() {
    let validator = UserProfile::validator();
    assert!(validator.validate(&scenario_a_input()).is_ok());

    let invalid: Vec<(&str, Value)> = vec![
        ("sex", json!("unknown")),
        ("sex", json!(null)),
        ("age", json!(0)),
        ("age", json!(17.5)),
        ("heightCm", json!(-180)),
        ("heightCm", json!("tall")),
        ("weightKg", json!(0.0)),
        ("fitnessGoal", json!(7)),
        ("healthConditions", json!(null)),
        ("sportsActivities", json!(["Running"])),
        ("documentation", json!(false)),
    ];
    for (field, value) in invalid {
        let mut input = scenario_a_input();
        input[field] = value.clone();
        let errs = validator.validate(&input).unwrap_err();
        assert!(
            errs.iter().any(|v| v.field == field),
            "{field}={value}: {errs:?}"
        );
    }
}

#[tokio::test]
async fn prompt_reaches_provider_with_profile_fields() {
    let generator = RoutineGenerator::new(FnProvider::new(|prompt: String| async move {
        assert!(prompt.contains("- Primary fitness goal: muscle gain"));
        assert!(prompt.contains("Hypertrophy: 8-12 reps"));
        Ok(json!({
            "workoutRoutine": [],
            "notes": "Please consult a coach before starting; this stub returns no routine at all."
        }))
    }));
    generator.generate(&scenario_a_input()).await.unwrap();
}

#[tokio::test]
async fn form_submission_end_to_end() {
    let form = ProfileForm {
        sex: "female".into(),
        age: "28".into(),
        height_cm: "168".into(),
        weight_kg: "61.5".into(),
        fitness_goal: "weight loss".into(),
        ..Default::default()
    };
    let generator = RoutineGenerator::new(FnProvider::returning(five_exercise_output()));
    let generation = generator.generate(&form.to_candidate()).await.unwrap();
    let summary = render_summary(&generation.result);
    assert!(summary.contains("Barbell Back Squat"));
    assert!(summary.contains("Muscle groups: Core"));
}

// ── Whole numbers written as decimals ───────────────────────────────

#[tokio::test]
async fn decimal_whole_numbers_pass_both_ends() {
    let mut input = scenario_a_input();
    input["age"] = json!(30.0);
    let mut output = five_exercise_output();
    output["workoutRoutine"][0]["sets"] = json!(4.0);
    let generator = RoutineGenerator::new(FnProvider::returning(output));

    let generation = generator.generate(&input).await.unwrap();
    assert_eq!(generation.result.workout_routine[0].sets, 4);
}

#[tokio::test]
async fn form_age_with_trailing_zero_is_accepted() {
    let form = ProfileForm {
        sex: "male".into(),
        age: "30.0".into(),
        height_cm: "180".into(),
        weight_kg: "80".into(),
        fitness_goal: "muscle gain".into(),
        ..Default::default()
    };
    let generator = RoutineGenerator::new(FnProvider::returning(five_exercise_output()));
    assert!(generator.generate(&form.to_candidate()).await.is_ok());
}

#[tokio::test]
async fn oversized_age_is_invalid_input_naming_age() {
    let mut input = scenario_a_input();
    input["age"] = json!(5_000_000_000u64);
    let (provider, calls) = counting_provider(five_exercise_output());
    let generator = RoutineGenerator::new(provider);

    let err = generator.generate(&input).await.unwrap_err();
    assert!(matches!(err, GenerationError::InvalidInput(_)), "{err:?}");
    assert_eq!(err.violations()[0].field, "age");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// ── Typed profiles ──────────────────────────────────────────────────

fn typed_profile() -> UserProfile {
    UserProfile {
        sex: Sex::Female,
        age: 52,
        height_cm: 162.0,
        weight_kg: 70.0,
        fitness_goal: "general fitness".into(),
        health_conditions: "Kyphosis".into(),
        sports_activities: "None".into(),
        documentation: "Kyphosis: favour rows and chest stretches.".into(),
    }
}

#[tokio::test]
async fn typed_profile_runs_the_flow() {
    let (provider, calls) = counting_provider(five_exercise_output());
    let generator = RoutineGenerator::new(provider);

    let generation = generator.generate_profile(&typed_profile()).await.unwrap();

    assert_eq!(generation.result.workout_routine.len(), 5);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn typed_profile_is_revalidated() {
    let profile = UserProfile {
        height_cm: -1.0,
        ..typed_profile()
    };
    let (provider, calls) = counting_provider(five_exercise_output());
    let generator = RoutineGenerator::new(provider);

    let err = generator.generate_profile(&profile).await.unwrap_err();
    assert!(matches!(err, GenerationError::InvalidInput(_)), "{err:?}");
    assert_eq!(
        err.violations(),
        &[Violation::new("heightCm", "must be a positive number")]
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
