use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

pub const NOT_FOUND_DETAIL: &str = "Company not found";
pub const INTERNAL_DETAIL: &str = "Internal server error";

#[derive(Debug, ThisError)]
pub enum GeoError {
    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Company not found")]
    NotFound,

    #[error("Failed to delete company: {0}")]
    DeleteFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Unsupported database URL scheme: {0}")]
    UnsupportedDatabase(String),

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for GeoError {
    fn from(e: figment::Error) -> Self {
        GeoError::Config(Box::new(e))
    }
}

impl GeoError {
    pub fn invalid(loc: &[&str], msg: impl Into<String>, kind: &str) -> Self {
        GeoError::Validation(vec![FieldError::new(loc, msg, kind)])
    }
}

/// One entry of a 422 body, e.g. `{"loc": ["body", "latitude"], "msg": "...", "type": "less_than_equal"}`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    pub fn new(loc: &[&str], msg: impl Into<String>, kind: &str) -> Self {
        Self {
            loc: loc.iter().map(|s| s.to_string()).collect(),
            msg: msg.into(),
            kind: kind.to_string(),
        }
    }
}

/// Every error body has the shape `{"detail": ...}`.
#[derive(Serialize)]
pub struct ApiErrorResponse<T: Serialize> {
    pub detail: T,
}

impl IntoResponse for GeoError {
    fn into_response(self) -> Response {
        match self {
            GeoError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiErrorResponse { detail: errors }),
            )
                .into_response(),
            GeoError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(ApiErrorResponse {
                    detail: NOT_FOUND_DETAIL,
                }),
            )
                .into_response(),
            GeoError::DeleteFailed(cause) => {
                error!(error = %cause, "delete rolled back");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiErrorResponse {
                        detail: format!("Failed to delete company: {cause}"),
                    }),
                )
                    .into_response()
            }
            other => {
                error!(error = %other, "unhandled error");
                internal_error_response()
            }
        }
    }
}

/// Opaque 500 used for unexpected failures and caught panics.
pub fn internal_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiErrorResponse {
            detail: INTERNAL_DETAIL,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::{Value, json};

    async fn body_of(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn not_found_maps_to_404_detail() {
        let resp = GeoError::NotFound.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(resp).await, json!({"detail": "Company not found"}));
    }

    #[tokio::test]
    async fn database_errors_do_not_leak() {
        let resp = GeoError::DatabaseError(SqlxError::PoolTimedOut).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(resp).await, json!({"detail": "Internal server error"}));
    }

    #[tokio::test]
    async fn listener_io_errors_are_opaque() {
        let err = GeoError::from(std::io::Error::new(
            std::io::ErrorKind::AddrInUse,
            "address already in use",
        ));
        assert!(matches!(err, GeoError::Io(_)));
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(resp).await, json!({"detail": "Internal server error"}));
    }

    #[tokio::test]
    async fn delete_failure_carries_cause() {
        let resp = GeoError::DeleteFailed("disk full".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_of(resp).await,
            json!({"detail": "Failed to delete company: disk full"})
        );
    }

    #[tokio::test]
    async fn validation_lists_fields() {
        let resp = GeoError::invalid(&["body", "latitude"], "out of range", "range").into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body_of(resp).await,
            json!({"detail": [{"loc": ["body", "latitude"], "msg": "out of range", "type": "range"}]})
        );
    }
}
