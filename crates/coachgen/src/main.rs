//! Generate a personalized workout routine from the command line.
//!
//! Reads the API key from the `OPENROUTER_KEY` environment variable.
//!
//! # Examples
//!
//! ```sh
//! # Basic request
//! coachgen --sex male --age 30 --height-cm 180 --weight-kg 80 --goal "muscle gain"
//!
//! # With health conditions and reference documentation from a file
//! coachgen --sex female --age 52 --height-cm 162 --weight-kg 70 \
//!   --goal "general fitness" --conditions "Kyphosis" \
//!   --documentation-file guidelines.md
//!
//! # Inspect the prompt without calling the provider
//! coachgen --sex male --age 30 --height-cm 180 --weight-kg 80 --goal "endurance" --print-prompt
//!
//! # Machine-readable output
//! coachgen ... --json
//! ```

use std::path::Path;
use std::process;

use clap::Parser;
use coachgen::prelude::*;
use tracing::warn;

/// Generate a personalized workout routine.
///
/// Reads the API key from the OPENROUTER_KEY environment variable.
#[derive(Parser)]
#[command(name = "coachgen")]
struct Cli {
    // ── Profile ────────────────────────────────────────────────
    /// Sex: male or female
    #[arg(long, default_value = "")]
    sex: String,

    /// Age in years
    #[arg(long, default_value = "")]
    age: String,

    /// Height in centimeters
    #[arg(long, default_value = "")]
    height_cm: String,

    /// Weight in kilograms
    #[arg(long, default_value = "")]
    weight_kg: String,

    /// Primary fitness goal (e.g. weight loss, muscle gain, general fitness)
    #[arg(long, default_value = "")]
    goal: String,

    /// Health conditions (empty means none)
    #[arg(long, default_value = "")]
    conditions: String,

    /// Sports practiced and the goal for each, e.g. "Running (improve 10k time)"
    #[arg(long, default_value = "")]
    sports: String,

    /// Reference medical or fitness documentation, inline
    #[arg(long, conflicts_with = "documentation_file")]
    documentation: Option<String>,

    /// Read reference documentation from a file
    #[arg(long)]
    documentation_file: Option<String>,

    // ── Provider ───────────────────────────────────────────────
    /// Model to use
    #[arg(long, default_value = coachgen::DEFAULT_MODEL)]
    model: String,

    /// Maximum tokens in the response
    #[arg(long, default_value_t = 4096)]
    max_tokens: u32,

    /// Sampling temperature
    #[arg(long, default_value_t = 0.4)]
    temperature: f32,

    /// Disable the response-healing plugin
    #[arg(long)]
    no_response_healing: bool,

    // ── Validation ─────────────────────────────────────────────
    /// Fail when an exercise image URL does not follow the expected format
    #[arg(long)]
    strict_images: bool,

    // ── Output mode ────────────────────────────────────────────
    /// Print the validated routine as JSON
    #[arg(long)]
    json: bool,

    /// Print the rendered prompt and exit without calling the provider
    #[arg(long)]
    print_prompt: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn config(&self) -> GeneratorConfig {
        GeneratorConfig {
            response_healing: !self.no_response_healing,
            ..GeneratorConfig::default()
                .with_model(&self.model)
                .with_max_tokens(self.max_tokens)
                .with_temperature(self.temperature)
                .with_strict_image_urls(self.strict_images)
        }
    }
}

// ── Helpers ────────────────────────────────────────────────────────

fn read_documentation(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read documentation file '{}': {e}", path.display()))
}

fn build_form(cli: &Cli) -> Result<ProfileForm, String> {
    let documentation = match (&cli.documentation, &cli.documentation_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => read_documentation(Path::new(path))?,
        (None, None) => String::new(),
    };
    Ok(ProfileForm {
        sex: cli.sex.clone(),
        age: cli.age.clone(),
        height_cm: cli.height_cm.clone(),
        weight_kg: cli.weight_kg.clone(),
        fitness_goal: cli.goal.clone(),
        health_conditions: cli.conditions.clone(),
        sports_activities: cli.sports.clone(),
        documentation,
    })
}

fn format_generation(generation: &Generation, json: bool) -> Result<String, String> {
    if json {
        return serde_json::to_string_pretty(&generation.result)
            .map_err(|e| format!("failed to serialize routine: {e}"));
    }
    let mut out = render_summary(&generation.result);
    for w in &generation.warnings {
        out.push_str(&format!("\nwarning: {w}"));
    }
    Ok(out)
}

async fn run(cli: &Cli) -> Result<String, String> {
    let form = build_form(cli)?;
    let candidate = form.to_candidate();
    let config = cli.config();

    if cli.print_prompt {
        let generator = config.apply(RoutineGenerator::new(FnProvider::failing("prompt only")));
        let profile = generator.validate_input(&candidate).map_err(|e| {
            warn!("{e}");
            display_error(&e).to_string()
        })?;
        return Ok(generator.prompt_for(&profile));
    }

    let api_key = api_key_from_env()?;
    let generator = config
        .build_generator(api_key)
        .map_err(|e| format!("failed to create API client: {e}"))?;

    match generator.generate(&candidate).await {
        Ok(generation) => format_generation(&generation, cli.json),
        Err(e) => {
            warn!(kind = e.kind(), "{e}");
            Err(display_error(&e).to_string())
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = coachgen::logging::init(&cli.log_level) {
        eprintln!("Warning: {e}");
    }

    match run(&cli).await {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
