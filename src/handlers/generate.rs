use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Deserializer};
use tracing::{debug, error, warn};

use crate::handlers::responses::{crisis_failure, generate_failure, generate_success};
use crate::prompt::{contains_crisis_language, reflect_insight};
use crate::state::AppState;
use crate::utils::logging::PROMPT_TARGET;
use crate::utils::timing::{complete_request_timer, RequestTimer};

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub feeling: String,
    #[serde(deserialize_with = "deserialize_intensity")]
    pub intensity: i64,
}

/// Browsers send the slider value as a JSON number that may carry a
/// fraction. Rounding up keeps every `value > threshold` comparison intact
/// for the integer band thresholds.
fn deserialize_intensity<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(value.ceil() as i64)
}

pub async fn generate_handler(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!("Rejected generate request: {}", rejection.body_text());
            return generate_failure(
                StatusCode::BAD_REQUEST,
                format!("Invalid request body: {}", rejection.body_text()),
            );
        }
    };

    let mut timer = RequestTimer::new("generate").with_feeling(&request.feeling, request.intensity);
    timer.log_received();

    if request.feeling.trim().is_empty() {
        complete_request_timer(&mut timer, "invalid_request", Some("blank feeling".to_string()));
        return generate_failure(
            StatusCode::BAD_REQUEST,
            "Describe a feeling before generating.",
        );
    }

    if state.safety.enabled && contains_crisis_language(&request.feeling) {
        complete_request_timer(&mut timer, "crisis", None);
        return crisis_failure(&state.safety.message);
    }

    let prompt = state.composer.compose(&request.feeling, request.intensity);
    debug!(target: PROMPT_TARGET, prompt = %prompt, "Generating with prompt");

    match state.generator.generate(&prompt).await {
        Ok(image) => {
            complete_request_timer(&mut timer, "success", None);
            generate_success(image, reflect_insight(&request.feeling))
        }
        Err(err) => {
            error!("Image generation failed: {}", err);
            complete_request_timer(&mut timer, "error", Some(err.to_string()));
            generate_failure(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}
