use std::any::Any;

use axum::{
    Router,
    response::Response,
    routing::get,
};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use crate::db::traits::CompanyStore;
use crate::error::internal_error_response;
use crate::handlers::companies::{
    create_company, delete_company, get_company, list_companies, update_company,
};
use crate::handlers::system::{
    health_handler, method_not_allowed_handler, not_found_handler, root_handler,
};

/// Shared handler state. The store is injected here and nowhere else.
#[derive(Clone)]
pub struct GeoState<S> {
    pub store: S,
}

impl<S: CompanyStore> GeoState<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

pub fn geo_router<S: CompanyStore>(state: GeoState<S>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route(
            "/api/companies",
            get(list_companies::<S>).post(create_company::<S>),
        )
        .route(
            "/api/companies/",
            get(list_companies::<S>).post(create_company::<S>),
        )
        .route(
            "/api/companies/{id}",
            get(get_company::<S>)
                .patch(update_company::<S>)
                .delete(delete_company::<S>),
        )
        .fallback(not_found_handler)
        .method_not_allowed_fallback(method_not_allowed_handler)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let reason = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("<non-string panic>");
    error!(reason, "handler panicked");
    internal_error_response()
}
