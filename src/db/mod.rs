//! Database module: models, schema and the two storage backends.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and partial updates
//! - `point.rs`: the derived WGS84 point and its EWKT text form
//! - `schema.rs`: versioned DDL per backend
//! - `migrations.rs`: migration runner and schema filter
//! - `traits.rs`: the `CompanyStore` seam used by handlers
//! - `postgres.rs` / `sqlite.rs`: PostGIS and SQLite implementations

pub mod migrations;
pub mod models;
pub mod point;
pub mod postgres;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use migrations::{Dialect, MigrationBackend, Migrator, SchemaFilter};
pub use models::{Company, CompanyChanges, NewCompany};
pub use point::{GeoPoint, SRID_WGS84};
pub use postgres::{PgCompanyStore, PgPool};
pub use sqlite::{SqliteCompanyStore, SqlitePool};
pub use traits::CompanyStore;

use crate::error::GeoError;

/// Backend picked at runtime from the connection string.
#[derive(Clone)]
pub enum Database {
    Postgres(PgCompanyStore),
    Sqlite(SqliteCompanyStore),
}

/// `sqlite:` URLs open the embedded backend, `postgres://` / `postgresql://` PostGIS.
pub async fn connect(url: &str, max_connections: u32) -> Result<Database, GeoError> {
    match Dialect::from_url(url)? {
        Dialect::Postgres => Ok(Database::Postgres(
            PgCompanyStore::connect(url, max_connections).await?,
        )),
        Dialect::Sqlite => Ok(Database::Sqlite(
            SqliteCompanyStore::connect(url, max_connections).await?,
        )),
    }
}

impl Dialect {
    pub fn from_url(url: &str) -> Result<Self, GeoError> {
        let scheme = url.split_once(':').map(|(s, _)| s).unwrap_or_default();
        match scheme.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "sqlite" => Ok(Dialect::Sqlite),
            other => Err(GeoError::UnsupportedDatabase(other.to_string())),
        }
    }
}

impl CompanyStore for Database {
    async fn list(&self, skip: i64, limit: i64) -> Result<(Vec<Company>, i64), GeoError> {
        match self {
            Database::Postgres(s) => s.list(skip, limit).await,
            Database::Sqlite(s) => s.list(skip, limit).await,
        }
    }

    async fn create(&self, company: NewCompany) -> Result<Company, GeoError> {
        match self {
            Database::Postgres(s) => s.create(company).await,
            Database::Sqlite(s) => s.create(company).await,
        }
    }

    async fn get(&self, id: i32) -> Result<Option<Company>, GeoError> {
        match self {
            Database::Postgres(s) => s.get(id).await,
            Database::Sqlite(s) => s.get(id).await,
        }
    }

    async fn update(&self, id: i32, changes: CompanyChanges) -> Result<Option<Company>, GeoError> {
        match self {
            Database::Postgres(s) => s.update(id, changes).await,
            Database::Sqlite(s) => s.update(id, changes).await,
        }
    }

    async fn delete(&self, id: i32) -> Result<bool, GeoError> {
        match self {
            Database::Postgres(s) => s.delete(id).await,
            Database::Sqlite(s) => s.delete(id).await,
        }
    }

    async fn ping(&self) -> Result<(), GeoError> {
        match self {
            Database::Postgres(s) => s.ping().await,
            Database::Sqlite(s) => s.ping().await,
        }
    }
}

impl MigrationBackend for Database {
    fn dialect(&self) -> Dialect {
        match self {
            Database::Postgres(_) => Dialect::Postgres,
            Database::Sqlite(_) => Dialect::Sqlite,
        }
    }

    async fn ensure_ledger(&self) -> Result<(), GeoError> {
        match self {
            Database::Postgres(s) => s.ensure_ledger().await,
            Database::Sqlite(s) => s.ensure_ledger().await,
        }
    }

    async fn applied(&self) -> Result<Vec<migrations::AppliedMigration>, GeoError> {
        match self {
            Database::Postgres(s) => s.applied().await,
            Database::Sqlite(s) => s.applied().await,
        }
    }

    async fn apply_up(&self, migration: &'static migrations::Migration) -> Result<(), GeoError> {
        match self {
            Database::Postgres(s) => s.apply_up(migration).await,
            Database::Sqlite(s) => s.apply_up(migration).await,
        }
    }

    async fn apply_down(&self, migration: &'static migrations::Migration) -> Result<(), GeoError> {
        match self {
            Database::Postgres(s) => s.apply_down(migration).await,
            Database::Sqlite(s) => s.apply_down(migration).await,
        }
    }

    async fn table_names(&self) -> Result<Vec<String>, GeoError> {
        match self {
            Database::Postgres(s) => s.table_names().await,
            Database::Sqlite(s) => s.table_names().await,
        }
    }
}
