use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use tracing::error;

use crate::handlers::responses::proxy_failure;
use crate::llm::media::{fetch_image, validate_image_url, ProxyError};
use crate::state::AppState;
use crate::utils::timing::{complete_request_timer, start_request_timer};

#[derive(Debug, Deserialize)]
pub struct FetchImageRequest {
    #[serde(default)]
    pub url: Value,
}

fn proxy_error_response(err: &ProxyError) -> Response {
    match err {
        ProxyError::InvalidUrl => proxy_failure(StatusCode::BAD_REQUEST, "Invalid image URL"),
        ProxyError::UpstreamStatus(_) => {
            proxy_failure(StatusCode::BAD_REQUEST, "Failed to fetch image")
        }
        ProxyError::Transport(_) | ProxyError::TooLarge { .. } => {
            proxy_failure(StatusCode::INTERNAL_SERVER_ERROR, "Proxy server error")
        }
    }
}

/// Re-serves a remote image from this origin so the browser can read it.
pub async fn fetch_image_handler(
    State(state): State<AppState>,
    payload: Result<Json<FetchImageRequest>, JsonRejection>,
) -> Response {
    let mut timer = start_request_timer("fetch_image");

    let raw_url = match payload {
        Ok(Json(FetchImageRequest { url: Value::String(url) })) if !url.trim().is_empty() => url,
        _ => {
            complete_request_timer(&mut timer, "invalid_request", None);
            return proxy_error_response(&ProxyError::InvalidUrl);
        }
    };

    let result = match validate_image_url(&raw_url, &state.proxy.allowed_hosts) {
        Ok(url) => fetch_image(url, &state.proxy).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(image) => {
            complete_request_timer(&mut timer, "success", None);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, image.content_type),
                    (header::CACHE_CONTROL, "no-store".to_string()),
                ],
                image.bytes,
            )
                .into_response()
        }
        Err(err) => {
            if !matches!(err, ProxyError::InvalidUrl) {
                error!("Image proxy error: {}", err);
            }
            complete_request_timer(&mut timer, "error", Some(err.to_string()));
            proxy_error_response(&err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use axum::routing::get;
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::handlers::router;
    use crate::llm::media::ProxySettings;
    use crate::llm::StabilityClient;
    use crate::prompt::{PromptComposer, SafetySettings};
    use crate::state::AppState;

    const PNG_BYTES: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52,
    ];

    fn proxy_state(max_bytes: usize) -> AppState {
        proxy_state_allowing(max_bytes, Vec::new())
    }

    fn proxy_state_allowing(max_bytes: usize, allowed_hosts: Vec<String>) -> AppState {
        AppState::new(
            PromptComposer::default(),
            Arc::new(StabilityClient::from_config(&crate::config::CONFIG)),
            SafetySettings::default(),
            ProxySettings {
                allowed_hosts,
                max_bytes,
                timeout: Duration::from_secs(5),
            },
        )
    }

    async fn spawn_image_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test server");
        let addr = listener.local_addr().expect("local addr");
        let same_host = format!("http://{addr}/typed.png");
        let other_host = format!("http://localhost:{}/typed.png", addr.port());

        let app = Router::new()
            .route(
                "/typed.png",
                get(|| async { ([(header::CONTENT_TYPE, "image/png")], PNG_BYTES) }),
            )
            .route("/large", get(|| async { PNG_BYTES }))
            .route("/missing.png", get(|| async { (StatusCode::NOT_FOUND, "gone") }))
            .route(
                "/hop",
                get(move || async move { (StatusCode::FOUND, [(header::LOCATION, same_host)]) }),
            )
            .route(
                "/hop-away",
                get(move || async move { (StatusCode::FOUND, [(header::LOCATION, other_host)]) }),
            );
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    async fn post_fetch(state: AppState, body: Value) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri("/api/fetch-image")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        router(state).oneshot(request).await.expect("response")
    }

    async fn error_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let value: Value = serde_json::from_slice(&bytes).expect("json body");
        value["error"].as_str().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn rejects_missing_or_invalid_urls() {
        for body in [json!({}), json!({ "url": 42 }), json!({ "url": "ftp://host/a.png" })] {
            let response = post_fetch(proxy_state(1024), body).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(error_text(response).await, "Invalid image URL");
        }
    }

    #[tokio::test]
    async fn relays_image_bytes_without_caching() {
        let base = spawn_image_server().await;
        let response =
            post_fetch(proxy_state(1024), json!({ "url": format!("{base}/typed.png") })).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        assert_eq!(&bytes[..], PNG_BYTES);
    }

    #[tokio::test]
    async fn upstream_errors_map_to_client_and_server_failures() {
        let base = spawn_image_server().await;

        let response =
            post_fetch(proxy_state(1024), json!({ "url": format!("{base}/missing.png") })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_text(response).await, "Failed to fetch image");

        let response = post_fetch(proxy_state(4), json!({ "url": format!("{base}/large") })).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_text(response).await, "Proxy server error");
    }

    #[tokio::test]
    async fn redirects_are_held_to_the_allowlist() {
        let base = spawn_image_server().await;
        let allowed = vec!["127.0.0.1".to_string()];

        let response = post_fetch(
            proxy_state_allowing(1024, allowed.clone()),
            json!({ "url": format!("{base}/hop-away") }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_text(response).await, "Invalid image URL");

        let response = post_fetch(
            proxy_state_allowing(1024, allowed),
            json!({ "url": format!("{base}/hop") }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        assert_eq!(&bytes[..], PNG_BYTES);
    }
}
