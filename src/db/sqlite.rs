use crate::db::migrations::{AppliedMigration, Dialect, Migration, MigrationBackend};
use crate::db::models::{Company, CompanyChanges, NewCompany};
use crate::db::point::GeoPoint;
use crate::db::schema::SQLITE_LEDGER;
use crate::db::traits::CompanyStore;
use crate::error::GeoError;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use std::time::Duration;

pub type SqlitePool = Pool<Sqlite>;

const SELECT_COMPANY: &str =
    "SELECT id, name, industry, location, latitude, longitude, geom FROM companies";

/// Companies table on SQLite; `geom` is stored as EWKT text.
#[derive(Clone)]
pub struct SqliteCompanyStore {
    pool: SqlitePool,
}

impl SqliteCompanyStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database behind `url`. In-memory
    /// databases are pinned to a single long-lived connection, otherwise each
    /// pooled connection would see its own empty database.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, GeoError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options.connect_with(options).await?;
        Ok(Self::new(pool))
    }

    pub async fn in_memory() -> Result<Self, GeoError> {
        Self::connect("sqlite::memory:", 1).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn row_to_model(row: SqliteRow) -> Result<Company, GeoError> {
        let id: i32 = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let industry: String = row.try_get("industry")?;
        let location: String = row.try_get("location")?;
        let latitude: f64 = row.try_get("latitude")?;
        let longitude: f64 = row.try_get("longitude")?;
        let geom_text: String = row.try_get("geom")?;

        let geom = GeoPoint::from_str(&geom_text).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Company {
            id,
            name,
            industry,
            location,
            latitude,
            longitude,
            geom,
        })
    }
}

impl CompanyStore for SqliteCompanyStore {
    async fn list(&self, skip: i64, limit: i64) -> Result<(Vec<Company>, i64), GeoError> {
        let rows = sqlx::query(&format!("{SELECT_COMPANY} ORDER BY id LIMIT ? OFFSET ?"))
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?;
        let companies = rows
            .into_iter()
            .map(Self::row_to_model)
            .collect::<Result<Vec<_>, _>>()?;

        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM companies")
            .fetch_one(&self.pool)
            .await?;
        Ok((companies, total.0))
    }

    async fn create(&self, company: NewCompany) -> Result<Company, GeoError> {
        let geom = company.geom();
        let rec: (i32,) = sqlx::query_as(
            r#"
            INSERT INTO companies (name, industry, location, latitude, longitude, geom)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&company.name)
        .bind(&company.industry)
        .bind(&company.location)
        .bind(company.latitude)
        .bind(company.longitude)
        .bind(geom.to_ewkt())
        .fetch_one(&self.pool)
        .await?;

        Ok(Company {
            id: rec.0,
            name: company.name,
            industry: company.industry,
            location: company.location,
            latitude: company.latitude,
            longitude: company.longitude,
            geom,
        })
    }

    async fn get(&self, id: i32) -> Result<Option<Company>, GeoError> {
        let row = sqlx::query(&format!("{SELECT_COMPANY} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_model).transpose()
    }

    async fn update(&self, id: i32, changes: CompanyChanges) -> Result<Option<Company>, GeoError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!("{SELECT_COMPANY} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut company = Self::row_to_model(row)?;
        if changes.is_empty() {
            return Ok(Some(company));
        }
        company.apply(changes);

        sqlx::query(
            r#"UPDATE companies SET
                name = ?,
                industry = ?,
                location = ?,
                latitude = ?,
                longitude = ?,
                geom = ?
              WHERE id = ?"#,
        )
        .bind(&company.name)
        .bind(&company.industry)
        .bind(&company.location)
        .bind(company.latitude)
        .bind(company.longitude)
        .bind(company.geom.to_ewkt())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(company))
    }

    async fn delete(&self, id: i32) -> Result<bool, GeoError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM companies WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await;

        match result {
            Ok(done) if done.rows_affected() > 0 => {
                tx.commit().await?;
                Ok(true)
            }
            Ok(_) => {
                tx.rollback().await?;
                Ok(false)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e.into())
            }
        }
    }

    async fn ping(&self) -> Result<(), GeoError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

impl MigrationBackend for SqliteCompanyStore {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn ensure_ledger(&self) -> Result<(), GeoError> {
        sqlx::query(SQLITE_LEDGER).execute(&self.pool).await?;
        Ok(())
    }

    async fn applied(&self) -> Result<Vec<AppliedMigration>, GeoError> {
        let rows = sqlx::query(
            "SELECT version, description, checksum, applied_at FROM _geotag_migrations ORDER BY version",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<AppliedMigration, GeoError> {
                let applied_at: String = row.try_get("applied_at")?;
                let applied_at = DateTime::parse_from_rfc3339(&applied_at)
                    .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
                    .with_timezone(&Utc);
                Ok(AppliedMigration {
                    version: row.try_get("version")?,
                    description: row.try_get("description")?,
                    checksum: row.try_get("checksum")?,
                    applied_at,
                })
            })
            .collect()
    }

    async fn apply_up(&self, migration: &'static Migration) -> Result<(), GeoError> {
        let mut tx = self.pool.begin().await?;
        for stmt in migration.up_statements() {
            sqlx::query(stmt).execute(&mut *tx).await?;
        }
        sqlx::query(
            "INSERT INTO _geotag_migrations (version, description, checksum, applied_at) VALUES (?, ?, ?, ?)",
        )
        .bind(migration.version)
        .bind(migration.description)
        .bind(migration.checksum())
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn apply_down(&self, migration: &'static Migration) -> Result<(), GeoError> {
        let mut tx = self.pool.begin().await?;
        for stmt in migration.down_statements() {
            sqlx::query(stmt).execute(&mut *tx).await?;
        }
        sqlx::query("DELETE FROM _geotag_migrations WHERE version = ?")
            .bind(migration.version)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn table_names(&self) -> Result<Vec<String>, GeoError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}
