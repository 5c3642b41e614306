use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::llm::media::detect_mime_type;
use crate::llm::{ImageGenerationError, ImageGenerator};
use crate::utils::http::get_http_client;
use crate::utils::logging::PROMPT_TARGET;
use crate::utils::timing::log_generation_timing;

const ERROR_BODY_LOG_LIMIT: usize = 800;

#[derive(Debug, Deserialize)]
struct TextToImageResponse {
    artifacts: Option<Vec<Artifact>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Artifact {
    base64: Option<String>,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StabilityClient {
    api_key: String,
    api_base: String,
    engine: String,
    cfg_scale: f32,
    width: u32,
    height: u32,
    steps: u32,
    timeout: Duration,
}

impl StabilityClient {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_key: config.stability_api_key.trim().to_string(),
            api_base: config.stability_api_base.clone(),
            engine: config.stability_engine.clone(),
            cfg_scale: config.stability_cfg_scale,
            width: config.stability_width,
            height: config.stability_height,
            steps: config.stability_steps,
            timeout: Duration::from_secs(config.generation_timeout_seconds.max(1)),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/generation/{}/text-to-image",
            self.api_base, self.engine
        )
    }

    fn build_payload(&self, prompt: &str) -> Value {
        json!({
            "text_prompts": [{ "text": prompt, "weight": 1 }],
            "cfg_scale": self.cfg_scale,
            "height": self.height,
            "width": self.width,
            "samples": 1,
            "steps": self.steps,
        })
    }

    fn redact(&self, text: &str) -> String {
        if self.api_key.is_empty() {
            return text.to_string();
        }
        text.replace(&self.api_key, "[redacted]")
    }

    async fn request_image(&self, prompt: &str) -> Result<String, ImageGenerationError> {
        let response = get_http_client()
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.timeout)
            .json(&self.build_payload(prompt))
            .send()
            .await
            .map_err(|err| {
                let text = self.redact(&err.to_string());
                warn!(
                    "Stability request failed to send: {} (timeout={}, connect={})",
                    text,
                    err.is_timeout(),
                    err.is_connect()
                );
                ImageGenerationError::Transport(text)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let (message, body_summary) = summarize_error_body(&body);
            warn!("Stability API error: status={}, body={}", status, body_summary);
            return Err(ImageGenerationError::Api {
                status: status.as_u16(),
                detail: message.unwrap_or(body_summary),
            });
        }

        let payload = response
            .json::<TextToImageResponse>()
            .await
            .map_err(|err| ImageGenerationError::InvalidPayload(err.to_string()))?;
        image_from_response(payload)
    }
}

#[async_trait]
impl ImageGenerator for StabilityClient {
    async fn generate(&self, prompt: &str) -> Result<String, ImageGenerationError> {
        if self.api_key.is_empty() {
            return Err(ImageGenerationError::MissingApiKey);
        }
        debug!(target: PROMPT_TARGET, engine = %self.engine, prompt = %prompt);
        log_generation_timing("stability", &self.engine, "text_to_image", || {
            self.request_image(prompt)
        })
        .await
    }
}

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

/// Pulls a human-readable `message` out of a JSON error body, alongside a
/// truncated copy of the raw body for logs.
fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let summary = truncate_for_log(body.trim(), ERROR_BODY_LOG_LIMIT);
    let message = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        value
            .get("message")
            .or_else(|| value.get("error").and_then(|error| error.get("message")))
            .and_then(|message| message.as_str())
            .map(|message| message.trim().to_string())
            .filter(|message| !message.is_empty())
    });
    (message, summary)
}

fn image_from_response(response: TextToImageResponse) -> Result<String, ImageGenerationError> {
    let artifact = response
        .artifacts
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or(ImageGenerationError::EmptyResponse)?;

    if let Some(reason) = artifact.finish_reason.as_deref() {
        if reason.eq_ignore_ascii_case("CONTENT_FILTERED") {
            warn!("Stability artifact was content filtered");
        }
    }

    let encoded = artifact
        .base64
        .filter(|data| !data.trim().is_empty())
        .ok_or(ImageGenerationError::EmptyResponse)?;
    let bytes = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|err| ImageGenerationError::InvalidPayload(err.to_string()))?;
    let mime_type = detect_mime_type(&bytes).unwrap_or_else(|| "image/png".to_string());
    Ok(format!(
        "data:{};base64,{}",
        mime_type,
        general_purpose::STANDARD.encode(&bytes)
    ))
}
