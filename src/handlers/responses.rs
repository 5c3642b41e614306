use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct GenerateSuccess {
    pub success: bool,
    pub image: String,
    pub insight: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateFailure {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub crisis: bool,
}

#[derive(Debug, Serialize)]
pub struct ProxyFailure {
    pub error: String,
}

pub fn generate_success(image: String, insight: &str) -> Response {
    let body = GenerateSuccess {
        success: true,
        image,
        insight: insight.to_string(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

pub fn generate_failure(status: StatusCode, error: impl Into<String>) -> Response {
    let body = GenerateFailure {
        success: false,
        error: error.into(),
        crisis: false,
    };
    (status, Json(body)).into_response()
}

pub fn crisis_failure(message: &str) -> Response {
    let body = GenerateFailure {
        success: false,
        error: message.to_string(),
        crisis: true,
    };
    (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
}

pub fn proxy_failure(status: StatusCode, error: &str) -> Response {
    let body = ProxyFailure {
        error: error.to_string(),
    };
    (status, Json(body)).into_response()
}
