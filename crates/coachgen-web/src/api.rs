//! REST endpoint handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use coachgen::error::GenerationError;
use coachgen::flow::{ImageUrlWarning, RoutineGenerator};
use coachgen::form::{GENERIC_ERROR, ProfileForm, display_error};
use coachgen::routine::GenerationResult;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

/// Shared application state passed to all handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<RoutineGenerator>,
}

/// Success body for `POST /api/routine`.
#[derive(Serialize)]
pub struct RoutineResponse {
    pub result: GenerationResult,
    pub warnings: Vec<String>,
}

/// Failure body. Carries only the generic user-facing message.
#[derive(Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}

fn status_for(err: &GenerationError) -> StatusCode {
    match err {
        GenerationError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn warning_lines(warnings: &[ImageUrlWarning]) -> Vec<String> {
    warnings.iter().map(ToString::to_string).collect()
}

/// POST /api/routine: generate a routine from raw form fields.
///
/// Returns 200 with the validated routine, 422 when the body is not a form
/// or the form does not describe a valid profile, and 502 for any failure
/// after that point.
pub async fn post_routine(
    State(app): State<AppState>,
    payload: Result<Json<ProfileForm>, JsonRejection>,
) -> Response {
    let form = match payload {
        Ok(Json(form)) => form,
        Err(rejection) => {
            warn!(kind = "invalid_input", "rejected form body: {rejection}");
            let body = ErrorBody {
                error: GENERIC_ERROR,
            };
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response();
        }
    };
    let candidate = form.to_candidate();
    match app.generator.generate(&candidate).await {
        Ok(generation) => {
            info!(trace_id = %generation.trace_id, "routine served");
            Json(RoutineResponse {
                warnings: warning_lines(&generation.warnings),
                result: generation.result,
            })
            .into_response()
        }
        Err(e) => {
            warn!(kind = e.kind(), "{e}");
            let body = ErrorBody {
                error: display_error(&e),
            };
            (status_for(&e), Json(body)).into_response()
        }
    }
}

/// GET /api/schema: the JSON Schema provider output is validated against.
pub async fn get_schema(State(app): State<AppState>) -> Json<Value> {
    Json(app.generator.output_schema().clone())
}
