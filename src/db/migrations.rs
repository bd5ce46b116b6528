use crate::db::schema::{OWNED_TABLES, POSTGRES_MIGRATIONS, SQLITE_MIGRATIONS};
use crate::error::GeoError;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    pub fn migrations(self) -> &'static [Migration] {
        match self {
            Dialect::Postgres => POSTGRES_MIGRATIONS,
            Dialect::Sqlite => SQLITE_MIGRATIONS,
        }
    }
}

#[derive(Debug)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub up: &'static str,
    pub down: &'static str,
}

impl Migration {
    /// CRC32 of the up script; a mismatch against the ledger means the bundled
    /// script was edited after being applied.
    pub fn checksum(&self) -> String {
        format!("{:08x}", crc32fast::hash(self.up.as_bytes()))
    }

    pub fn up_statements(&self) -> impl Iterator<Item = &'static str> {
        split_statements(self.up)
    }

    pub fn down_statements(&self) -> impl Iterator<Item = &'static str> {
        split_statements(self.down)
    }
}

fn split_statements(script: &'static str) -> impl Iterator<Item = &'static str> {
    script.split(';').map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppliedMigration {
    pub version: i64,
    pub description: String,
    pub checksum: String,
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct MigrationReport {
    pub applied: Vec<i64>,
    pub skipped: Vec<i64>,
}

#[derive(Debug)]
pub struct MigrationStatus {
    pub applied: Vec<AppliedMigration>,
    pub pending: Vec<&'static Migration>,
    pub unmanaged_tables: Vec<String>,
}

/// Storage side of the migration runner. Each `apply_*` call runs the script
/// and the ledger write in a single transaction.
pub trait MigrationBackend: Send + Sync {
    fn dialect(&self) -> Dialect;

    fn ensure_ledger(&self) -> impl Future<Output = Result<(), GeoError>> + Send;

    fn applied(&self) -> impl Future<Output = Result<Vec<AppliedMigration>, GeoError>> + Send;

    fn apply_up(
        &self,
        migration: &'static Migration,
    ) -> impl Future<Output = Result<(), GeoError>> + Send;

    fn apply_down(
        &self,
        migration: &'static Migration,
    ) -> impl Future<Output = Result<(), GeoError>> + Send;

    fn table_names(&self) -> impl Future<Output = Result<Vec<String>, GeoError>> + Send;
}

/// Decides which database tables belong to this service's schema.
#[derive(Debug, Clone)]
pub struct SchemaFilter {
    owned: HashSet<String>,
    excluded: HashSet<String>,
}

impl SchemaFilter {
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            owned: OWNED_TABLES.iter().map(|t| t.to_string()).collect(),
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }

    /// False for foreign extension tables listed in the deny-list.
    pub fn includes_table(&self, name: &str) -> bool {
        !self.excluded.contains(name)
    }

    pub fn is_owned(&self, name: &str) -> bool {
        self.owned.contains(name)
    }

    /// Tables that are neither ours nor excluded, sorted by name.
    pub fn unmanaged(&self, tables: &[String]) -> Vec<String> {
        let mut out: Vec<String> = tables
            .iter()
            .filter(|t| self.includes_table(t) && !self.is_owned(t))
            .cloned()
            .collect();
        out.sort();
        out
    }
}

pub struct Migrator<'a, B> {
    backend: &'a B,
    filter: SchemaFilter,
}

impl<'a, B: MigrationBackend> Migrator<'a, B> {
    pub fn new(backend: &'a B, filter: SchemaFilter) -> Self {
        Self { backend, filter }
    }

    /// Apply every pending migration in version order. Re-running is a no-op.
    pub async fn up(&self) -> Result<MigrationReport, GeoError> {
        self.backend.ensure_ledger().await?;
        let applied = self.applied_by_version().await?;
        let mut report = MigrationReport::default();

        for migration in self.backend.dialect().migrations() {
            if let Some(existing) = applied.get(&migration.version) {
                ensure_checksum_match(migration, &existing.checksum)?;
                report.skipped.push(migration.version);
                continue;
            }
            self.backend.apply_up(migration).await?;
            info!(
                version = migration.version,
                description = migration.description,
                "migration applied"
            );
            report.applied.push(migration.version);
        }

        Ok(report)
    }

    /// Revert the `steps` most recently applied migrations, newest first.
    pub async fn down(&self, steps: usize) -> Result<Vec<i64>, GeoError> {
        self.backend.ensure_ledger().await?;
        let mut applied = self.backend.applied().await?;
        applied.sort_by_key(|m| std::cmp::Reverse(m.version));

        let mut reverted = Vec::new();
        for entry in applied.into_iter().take(steps) {
            let migration = self
                .backend
                .dialect()
                .migrations()
                .iter()
                .find(|m| m.version == entry.version)
                .ok_or_else(|| {
                    GeoError::Migration(format!(
                        "applied version {} is not bundled with this build",
                        entry.version
                    ))
                })?;
            self.backend.apply_down(migration).await?;
            info!(
                version = migration.version,
                description = migration.description,
                "migration reverted"
            );
            reverted.push(migration.version);
        }
        Ok(reverted)
    }

    pub async fn status(&self) -> Result<MigrationStatus, GeoError> {
        self.backend.ensure_ledger().await?;
        let mut applied = self.backend.applied().await?;
        applied.sort_by_key(|m| m.version);
        let done: HashSet<i64> = applied.iter().map(|m| m.version).collect();
        let pending = self
            .backend
            .dialect()
            .migrations()
            .iter()
            .filter(|m| !done.contains(&m.version))
            .collect();
        let tables = self.backend.table_names().await?;

        Ok(MigrationStatus {
            applied,
            pending,
            unmanaged_tables: self.filter.unmanaged(&tables),
        })
    }

    /// Log tables the service does not know about. Never fails startup.
    pub async fn warn_unmanaged(&self) {
        match self.backend.table_names().await {
            Ok(tables) => {
                for table in self.filter.unmanaged(&tables) {
                    warn!(table = %table, "table is neither owned nor excluded from the schema");
                }
            }
            Err(e) => warn!(error = %e, "failed to inspect database tables"),
        }
    }

    async fn applied_by_version(&self) -> Result<HashMap<i64, AppliedMigration>, GeoError> {
        Ok(self
            .backend
            .applied()
            .await?
            .into_iter()
            .map(|m| (m.version, m))
            .collect())
    }
}

fn ensure_checksum_match(migration: &Migration, existing: &str) -> Result<(), GeoError> {
    if existing != migration.checksum() {
        return Err(GeoError::Migration(format!(
            "checksum mismatch for version {} (recorded {}, bundled {})",
            migration.version,
            existing,
            migration.checksum()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_EXCLUDED_TABLES;

    #[test]
    fn filter_ignores_tiger_tables_and_reports_strangers() {
        let filter = SchemaFilter::new(DEFAULT_EXCLUDED_TABLES.iter().copied());
        let tables: Vec<String> = ["companies", "spatial_ref_sys", "zip_lookup", "legacy", "_geotag_migrations"]
            .iter()
            .map(|t| t.to_string())
            .collect();

        assert!(!filter.includes_table("spatial_ref_sys"));
        assert!(filter.includes_table("companies"));
        assert_eq!(filter.unmanaged(&tables), vec!["legacy".to_string()]);
    }

    #[test]
    fn scripts_split_into_statements() {
        let m = &SQLITE_MIGRATIONS[0];
        let up: Vec<_> = m.up_statements().collect();
        assert_eq!(up.len(), 4);
        assert!(up[0].starts_with("CREATE TABLE companies"));
        assert!(up[1].contains("IF NOT EXISTS idx_companies_geom"));

        let down: Vec<_> = m.down_statements().collect();
        assert_eq!(down.last(), Some(&"DROP TABLE companies"));
        assert!(down[2].contains("IF EXISTS idx_companies_geom"));
    }

    #[test]
    fn postgres_schema_uses_gist_geography() {
        let m = &POSTGRES_MIGRATIONS[0];
        assert!(m.up.contains("geography(POINT, 4326)"));
        assert!(m.up.contains("USING gist (geom)"));
        assert_eq!(m.checksum().len(), 8);
        assert_ne!(m.checksum(), SQLITE_MIGRATIONS[0].checksum());
    }
}
