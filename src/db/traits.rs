use crate::db::models::{Company, CompanyChanges, NewCompany};
use crate::error::GeoError;
use std::future::Future;

/// Persistence seam for the companies handlers.
///
/// Every call checks a connection (or transaction) out of the pool for its
/// own duration and hands it back on every exit path.
pub trait CompanyStore: Clone + Send + Sync + 'static {
    /// Window of `limit` rows after `skip`, ordered by id, plus the total row count.
    fn list(
        &self,
        skip: i64,
        limit: i64,
    ) -> impl Future<Output = Result<(Vec<Company>, i64), GeoError>> + Send;

    fn create(&self, company: NewCompany) -> impl Future<Output = Result<Company, GeoError>> + Send;

    fn get(&self, id: i32) -> impl Future<Output = Result<Option<Company>, GeoError>> + Send;

    /// Read-modify-write inside one transaction. `None` if the row is gone.
    fn update(
        &self,
        id: i32,
        changes: CompanyChanges,
    ) -> impl Future<Output = Result<Option<Company>, GeoError>> + Send;

    /// `false` if nothing matched. A failing delete is rolled back before the
    /// error is returned.
    fn delete(&self, id: i32) -> impl Future<Output = Result<bool, GeoError>> + Send;

    fn ping(&self) -> impl Future<Output = Result<(), GeoError>> + Send;
}
