//! HTTP form endpoint for `coachgen` routine generation.
//!
//! `coachgen-web` wraps a shared [`RoutineGenerator`] in an axum server. A
//! browser form (or any HTTP client) posts raw field strings; the server
//! converts them, runs the generation flow, and answers with either the
//! validated routine or a generic error message.
//!
//! # Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use coachgen::prelude::*;
//! use coachgen_web::{WebConfig, spawn_web};
//!
//! let generator = GeneratorConfig::default().build_generator(api_key)?;
//! let addr = spawn_web(Arc::new(generator), WebConfig::default()).await?;
//! println!("Form endpoint: http://{addr}/api/routine");
//! ```
//!
//! # Endpoints
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | `POST` | `/api/routine` | [`ProfileForm`](coachgen::form::ProfileForm) | `200 {"result", "warnings"}`, `422`/`502 {"error"}` |
//! | `GET` | `/api/schema` | | output JSON Schema |
//!
//! Anything else falls through to `static_dir` when one is configured.

mod api;
mod server;

pub use api::{ErrorBody, RoutineResponse};

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use coachgen::flow::RoutineGenerator;

/// Configuration for the web server.
pub struct WebConfig {
    /// Address to bind to. Default: `127.0.0.1:3001`.
    pub bind_addr: SocketAddr,
    /// Directory holding a static frontend build.
    ///
    /// If `None`, only the API endpoints are served.
    pub static_dir: Option<PathBuf>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            static_dir: None,
        }
    }
}

/// Spawn the web server on a Tokio task and return the bound address.
///
/// The generator is shared by every request; concurrent submissions each
/// make their own provider call. The server runs until the Tokio runtime
/// shuts down.
pub async fn spawn_web(
    generator: Arc<RoutineGenerator>,
    config: WebConfig,
) -> std::io::Result<SocketAddr> {
    let router = server::build_router(generator, config.static_dir);
    server::start_server(router, config.bind_addr).await
}
