use axum::{Json, extract::State, http::StatusCode};
use tracing::{debug, info};

use crate::db::traits::CompanyStore;
use crate::error::GeoError;
use crate::middleware::{ValidatedJson, ValidatedPath, ValidatedQuery};
use crate::router::GeoState;
use crate::types::company::{
    CompanyCreate, CompanyListResponse, CompanyResponse, CompanyUpdate, ListParams,
};

/// GET /api/companies?skip=&limit= -> one page of companies plus the overall count.
pub async fn list_companies<S: CompanyStore>(
    State(state): State<GeoState<S>>,
    ValidatedQuery(params): ValidatedQuery<ListParams>,
) -> Result<Json<CompanyListResponse>, GeoError> {
    let (companies, total) = state.store.list(params.skip, params.limit).await?;
    debug!(
        skip = params.skip,
        limit = params.limit,
        returned = companies.len(),
        total,
        "listed companies"
    );

    Ok(Json(CompanyListResponse {
        companies: companies.into_iter().map(CompanyResponse::from).collect(),
        total,
    }))
}

/// POST /api/companies -> 201 with the stored record.
pub async fn create_company<S: CompanyStore>(
    State(state): State<GeoState<S>>,
    ValidatedJson(payload): ValidatedJson<CompanyCreate>,
) -> Result<(StatusCode, Json<CompanyResponse>), GeoError> {
    let company = state.store.create(payload.into()).await?;
    info!(id = company.id, name = %company.name, "company created");
    Ok((StatusCode::CREATED, Json(company.into())))
}

pub async fn get_company<S: CompanyStore>(
    State(state): State<GeoState<S>>,
    ValidatedPath(id): ValidatedPath<i32>,
) -> Result<Json<CompanyResponse>, GeoError> {
    let company = state.store.get(id).await?.ok_or(GeoError::NotFound)?;
    Ok(Json(company.into()))
}

/// PATCH /api/companies/{id} -> apply the fields present in the body.
pub async fn update_company<S: CompanyStore>(
    State(state): State<GeoState<S>>,
    ValidatedPath(id): ValidatedPath<i32>,
    ValidatedJson(payload): ValidatedJson<CompanyUpdate>,
) -> Result<Json<CompanyResponse>, GeoError> {
    let company = state
        .store
        .update(id, payload.into())
        .await?
        .ok_or(GeoError::NotFound)?;
    info!(id = company.id, "company updated");
    Ok(Json(company.into()))
}

/// DELETE /api/companies/{id} -> 204. A storage failure while deleting has
/// already been rolled back by the store and is reported with its cause.
pub async fn delete_company<S: CompanyStore>(
    State(state): State<GeoState<S>>,
    ValidatedPath(id): ValidatedPath<i32>,
) -> Result<StatusCode, GeoError> {
    if state.store.get(id).await?.is_none() {
        return Err(GeoError::NotFound);
    }

    match state.store.delete(id).await {
        Ok(true) => {
            info!(id, "company deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(false) => Err(GeoError::NotFound),
        Err(GeoError::DatabaseError(cause)) => Err(GeoError::DeleteFailed(cause.to_string())),
        Err(e) => Err(GeoError::DeleteFailed(e.to_string())),
    }
}
