//! Versioned DDL for the `companies` table, one script set per backend.
//! Statements are separated by `;` and executed one by one.

use crate::db::migrations::Migration;

pub const COMPANIES_TABLE: &str = "companies";
pub const MIGRATIONS_TABLE: &str = "_geotag_migrations";

/// Tables this service owns. Anything else found in the database is either
/// excluded by configuration or reported as unmanaged.
pub const OWNED_TABLES: &[&str] = &[COMPANIES_TABLE, MIGRATIONS_TABLE];

/// PostGIS schema:
/// - `id` SERIAL primary key plus a secondary btree index
/// - `geom` geography(POINT, 4326), GiST indexed, created only if missing
/// - `name` btree index for lookups
pub const POSTGRES_MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "initial_migration",
    up: r#"
CREATE EXTENSION IF NOT EXISTS postgis;

CREATE TABLE companies (
    id SERIAL NOT NULL,
    name VARCHAR NOT NULL,
    industry VARCHAR NOT NULL,
    location VARCHAR NOT NULL,
    latitude DOUBLE PRECISION NOT NULL,
    longitude DOUBLE PRECISION NOT NULL,
    geom geography(POINT, 4326) NOT NULL,
    PRIMARY KEY (id)
);

CREATE INDEX IF NOT EXISTS idx_companies_geom ON companies USING gist (geom);
CREATE INDEX ix_companies_id ON companies (id);
CREATE INDEX ix_companies_name ON companies (name);
"#,
    down: r#"
DROP INDEX ix_companies_name;
DROP INDEX ix_companies_id;
DROP INDEX IF EXISTS idx_companies_geom;
DROP TABLE companies;
"#,
}];

/// SQLite mirror of the same shape. `geom` holds EWKT text
/// (`SRID=4326;POINT(lon lat)`); AUTOINCREMENT keeps ids from being reused.
pub const SQLITE_MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "initial_migration",
    up: r#"
CREATE TABLE companies (
    id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
    name VARCHAR NOT NULL,
    industry VARCHAR NOT NULL,
    location VARCHAR NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    geom TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_companies_geom ON companies (geom);
CREATE INDEX ix_companies_id ON companies (id);
CREATE INDEX ix_companies_name ON companies (name);
"#,
    down: r#"
DROP INDEX ix_companies_name;
DROP INDEX ix_companies_id;
DROP INDEX IF EXISTS idx_companies_geom;
DROP TABLE companies;
"#,
}];

pub const POSTGRES_LEDGER: &str = r#"
CREATE TABLE IF NOT EXISTS _geotag_migrations (
    version BIGINT PRIMARY KEY,
    description TEXT NOT NULL,
    checksum TEXT NOT NULL,
    applied_at TIMESTAMPTZ NOT NULL
)
"#;

pub const SQLITE_LEDGER: &str = r#"
CREATE TABLE IF NOT EXISTS _geotag_migrations (
    version INTEGER PRIMARY KEY,
    description TEXT NOT NULL,
    checksum TEXT NOT NULL,
    applied_at TEXT NOT NULL -- RFC3339
)
"#;
