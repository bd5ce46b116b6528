use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use geotag::db::{Company, CompanyChanges, GeoPoint, NewCompany};
use geotag::{CompanyStore, GeoError, GeoState, geo_router};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Store with one existing company whose delete always fails, and whose
/// list always hits an unexpected database error.
#[derive(Clone)]
struct BrokenStore;

fn existing() -> Company {
    Company {
        id: 1,
        name: "Acme".into(),
        industry: "Tools".into(),
        location: "Berlin".into(),
        latitude: 52.52,
        longitude: 13.405,
        geom: GeoPoint::new(13.405, 52.52),
    }
}

impl CompanyStore for BrokenStore {
    async fn list(&self, _skip: i64, _limit: i64) -> Result<(Vec<Company>, i64), GeoError> {
        Err(GeoError::DatabaseError(sqlx::Error::PoolTimedOut))
    }

    async fn create(&self, _company: NewCompany) -> Result<Company, GeoError> {
        Ok(existing())
    }

    async fn get(&self, id: i32) -> Result<Option<Company>, GeoError> {
        Ok((id == 1).then(existing))
    }

    async fn update(&self, _id: i32, _changes: CompanyChanges) -> Result<Option<Company>, GeoError> {
        panic!("update exploded")
    }

    async fn delete(&self, _id: i32) -> Result<bool, GeoError> {
        Err(GeoError::DatabaseError(sqlx::Error::Protocol(
            "disk I/O error".to_string(),
        )))
    }

    async fn ping(&self) -> Result<(), GeoError> {
        Ok(())
    }
}

async fn call(method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let app = geo_router(GeoState::new(BrokenStore));
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("failed to build request");

    let resp = app.oneshot(request).await.expect("request failed");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    (
        status,
        serde_json::from_slice(&bytes).expect("response body was not json"),
    )
}

#[tokio::test]
async fn failed_delete_reports_cause() {
    let (status, body) = call("DELETE", "/api/companies/1", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().expect("detail");
    assert!(detail.starts_with("Failed to delete company: "), "{detail}");
    assert!(detail.contains("disk I/O error"), "{detail}");
    assert!(!detail.contains("Database error"), "{detail}");
}

#[tokio::test]
async fn delete_checks_existence_first() {
    let (status, body) = call("DELETE", "/api/companies/2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"detail": "Company not found"}));
}

#[tokio::test]
async fn unexpected_errors_are_opaque() {
    let (status, body) = call("GET", "/api/companies", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"detail": "Internal server error"}));
}

#[tokio::test]
async fn panics_become_opaque_500() {
    let (status, body) = call("PATCH", "/api/companies/1", Some(json!({"name": "x"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"detail": "Internal server error"}));
}

#[tokio::test]
async fn validation_runs_before_storage() {
    // BrokenStore::create would succeed; the bad payload must never reach it.
    let (status, _) = call(
        "POST",
        "/api/companies",
        Some(json!({
            "name": "Acme",
            "industry": "Tools",
            "location": "Berlin",
            "latitude": 52.52,
            "longitude": 200.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
