use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, LOCATION};
use tracing::warn;
use url::Url;

use crate::utils::http::get_proxy_http_client;

pub fn detect_mime_type(data: &[u8]) -> Option<String> {
    if data.len() > 12 {
        let ftyp = &data[4..12];
        if ftyp.starts_with(b"ftyp") {
            let brand = &ftyp[4..8];
            if brand == b"heic" || brand == b"heif" || brand == b"hevc" {
                return Some("image/heic".to_string());
            }
        }
    }

    infer::get(data).map(|kind| kind.mime_type().to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Invalid image URL")]
    InvalidUrl,
    #[error("Failed to fetch image (status {0})")]
    UpstreamStatus(u16),
    #[error("Image request failed: {0}")]
    Transport(String),
    #[error("Image exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub struct ProxySettings {
    pub allowed_hosts: Vec<String>,
    pub max_bytes: usize,
    pub timeout: Duration,
}

/// Accepts only absolute http(s) URLs. A non-empty allowlist restricts the
/// host to exact matches or subdomains of its entries.
pub fn validate_image_url(raw: &str, allowed_hosts: &[String]) -> Result<Url, ProxyError> {
    let url = Url::parse(raw.trim()).map_err(|_| ProxyError::InvalidUrl)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ProxyError::InvalidUrl);
    }
    let host = url
        .host_str()
        .map(|host| host.to_lowercase())
        .ok_or(ProxyError::InvalidUrl)?;

    if !allowed_hosts.is_empty() {
        let allowed = allowed_hosts.iter().any(|entry| {
            host == *entry || host.ends_with(&format!(".{entry}"))
        });
        if !allowed {
            return Err(ProxyError::InvalidUrl);
        }
    }

    Ok(url)
}

const MAX_REDIRECTS: usize = 5;

fn redirect_target(current: &Url, response: &reqwest::Response) -> Option<String> {
    if !response.status().is_redirection() {
        return None;
    }
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    current.join(location.trim()).ok().map(|next| next.to_string())
}

async fn send_following_allowed_redirects(
    url: Url,
    settings: &ProxySettings,
) -> Result<(Url, reqwest::Response), ProxyError> {
    let mut current = url;
    for _ in 0..=MAX_REDIRECTS {
        let response = get_proxy_http_client()
            .get(current.clone())
            .timeout(settings.timeout)
            .send()
            .await
            .map_err(|err| {
                warn!(
                    "Failed to fetch image {current}: {err} (timeout={}, connect={})",
                    err.is_timeout(),
                    err.is_connect()
                );
                ProxyError::Transport(err.to_string())
            })?;

        match redirect_target(&current, &response) {
            Some(next) => {
                current = validate_image_url(&next, &settings.allowed_hosts).map_err(|err| {
                    warn!("Image fetch for {current} redirected to rejected URL {next}");
                    err
                })?;
            }
            None => return Ok((current, response)),
        }
    }

    Err(ProxyError::Transport(format!("more than {MAX_REDIRECTS} redirects")))
}

pub async fn fetch_image(url: Url, settings: &ProxySettings) -> Result<FetchedImage, ProxyError> {
    let (url, mut response) = send_following_allowed_redirects(url, settings).await?;

    let status = response.status();
    if !status.is_success() {
        warn!("Image fetch for {url} returned status {status}");
        return Err(ProxyError::UpstreamStatus(status.as_u16()));
    }

    if let Some(length) = response.content_length() {
        if length > settings.max_bytes as u64 {
            return Err(ProxyError::TooLarge {
                limit: settings.max_bytes,
            });
        }
    }

    let upstream_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    let mut bytes: Vec<u8> = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|err| ProxyError::Transport(err.to_string()))?
    {
        if bytes.len() + chunk.len() > settings.max_bytes {
            warn!("Image fetch for {url} exceeded {} bytes", settings.max_bytes);
            return Err(ProxyError::TooLarge {
                limit: settings.max_bytes,
            });
        }
        bytes.extend_from_slice(&chunk);
    }

    let content_type = upstream_type
        .or_else(|| detect_mime_type(&bytes))
        .unwrap_or_else(|| "image/png".to_string());

    Ok(FetchedImage {
        bytes,
        content_type,
    })
}
