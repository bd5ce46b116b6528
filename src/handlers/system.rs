use axum::{Json, http::StatusCode};
use serde::Serialize;

use crate::error::ApiErrorResponse;

pub const SERVICE_NAME: &str = "Geo-Tagging Company API";

#[derive(Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET / -> service metadata.
pub async fn root_handler() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

/// Unknown paths answer with the same `{"detail": ...}` body as every other error.
pub async fn not_found_handler() -> (StatusCode, Json<ApiErrorResponse<&'static str>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiErrorResponse {
            detail: "Not Found",
        }),
    )
}

pub async fn method_not_allowed_handler() -> (StatusCode, Json<ApiErrorResponse<&'static str>>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ApiErrorResponse {
            detail: "Method Not Allowed",
        }),
    )
}
