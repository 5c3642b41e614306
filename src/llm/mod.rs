pub mod media;
pub mod stability;

use async_trait::async_trait;

pub use stability::StabilityClient;

/// Display text is surfaced to the browser as the `error` field.
#[derive(Debug, thiserror::Error)]
pub enum ImageGenerationError {
    #[error("STABILITY_API_KEY is not configured.")]
    MissingApiKey,
    #[error("Image request failed: {0}")]
    Transport(String),
    #[error("Image API returned status {status}: {detail}")]
    Api { status: u16, detail: String },
    #[error("No image generated")]
    EmptyResponse,
    #[error("Invalid image payload: {0}")]
    InvalidPayload(String),
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Returns a data URI or a remote URL for the generated image.
    async fn generate(&self, prompt: &str) -> Result<String, ImageGenerationError>;
}
