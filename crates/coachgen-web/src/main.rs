//! Serve the routine generator over HTTP.
//!
//! # Usage
//!
//! ```bash
//! OPENROUTER_KEY=sk-... cargo run -p coachgen-web
//! OPENROUTER_KEY=sk-... cargo run -p coachgen-web -- --port 8080 --static-dir ./site
//! OPENROUTER_KEY=sk-... cargo run -p coachgen-web -- --model google/gemini-2.5-flash --strict-images
//! ```
//!
//! ## Submitting a form
//!
//! ```bash
//! curl -X POST http://127.0.0.1:3001/api/routine \
//!   -H 'content-type: application/json' \
//!   -d '{"sex":"male","age":"30","heightCm":"180","weightKg":"80","fitnessGoal":"muscle gain"}'
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use coachgen::prelude::*;
use coachgen_web::{WebConfig, spawn_web};

/// Routine generator web endpoint.
#[derive(Parser)]
#[command(about = "HTTP endpoint for personalized workout routine generation")]
struct Args {
    /// LLM model to use.
    #[arg(long, default_value = coachgen::DEFAULT_MODEL)]
    model: String,

    /// Port for the web server.
    #[arg(long, default_value_t = 3001)]
    port: u16,

    /// Serve a static frontend from this directory.
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Fail generations whose image URLs do not follow the expected format.
    #[arg(long)]
    strict_images: bool,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = Args::parse();
    coachgen::logging::init(&args.log_level)?;

    let api_key = api_key_from_env()?;
    let generator = GeneratorConfig::default()
        .with_model(&args.model)
        .with_strict_image_urls(args.strict_images)
        .build_generator(api_key)
        .map_err(|e| format!("failed to create API client: {e}"))?;

    let web_config = WebConfig {
        bind_addr: ([127, 0, 0, 1], args.port).into(),
        static_dir: args.static_dir,
    };
    let addr = spawn_web(Arc::new(generator), web_config)
        .await
        .map_err(|e| format!("failed to start server: {e}"))?;
    println!("Routine endpoint: http://{addr}/api/routine");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("failed to wait for shutdown signal: {e}"))?;
    Ok(())
}
