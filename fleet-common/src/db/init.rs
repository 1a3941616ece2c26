//! Database initialization
//!
//! Creates the SQLite file on first run and the full schema idempotently.
//! Tables:
//! - ports, fleets, fleetassettemplates (join)
//! - assettemplates, components
//! - assets, assetparts
//! - inspections, attachments (polymorphic owner/target)
//! - users, sessions, login_challenges

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open (creating if needed) the database and bring the schema up to date
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL: concurrent readers alongside the single writer
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_schema(&pool).await?;
    crate::db::migrations::run_migrations(&pool).await?;

    Ok(pool)
}

/// Fresh in-memory database with the full schema
///
/// Single connection so every query sees the same memory database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    create_schema(&pool).await?;
    crate::db::migrations::run_migrations(&pool).await?;

    Ok(pool)
}

/// Create every table (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // Foreign keys are per-connection; sqlx enables them by default,
    // this keeps single-connection pools explicit about it.
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    create_schema_version_table(pool).await?;
    create_users_table(pool).await?;
    create_sessions_table(pool).await?;
    create_login_challenges_table(pool).await?;
    create_ports_table(pool).await?;
    create_fleets_table(pool).await?;
    create_asset_templates_table(pool).await?;
    create_components_table(pool).await?;
    create_fleet_templates_table(pool).await?;
    create_assets_table(pool).await?;
    create_asset_parts_table(pool).await?;
    create_inspections_table(pool).await?;
    create_attachments_table(pool).await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            role_id TEXT NOT NULL CHECK (role_id IN ('viewer', 'reporter', 'editor', 'owner')),
            time_created INTEGER NOT NULL,
            time_updated INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            expiry INTEGER NOT NULL,
            time_created INTEGER NOT NULL,
            time_updated INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Pending magic-link challenges; only the token digest is stored
pub async fn create_login_challenges_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS login_challenges (
            token_hash TEXT PRIMARY KEY,
            email TEXT NOT NULL,
            expiry INTEGER NOT NULL,
            time_created INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_ports_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ports (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            location_lat REAL NOT NULL,
            location_lng REAL NOT NULL,
            location_elevation REAL NOT NULL,
            time_created INTEGER NOT NULL,
            time_updated INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_fleets_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS fleets (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            port_id TEXT REFERENCES ports(id) ON DELETE SET NULL,
            time_created INTEGER NOT NULL,
            time_updated INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_asset_templates_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS assettemplates (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            manufacturer_id TEXT NOT NULL,
            product_weight INTEGER,
            product_width INTEGER,
            product_height INTEGER,
            product_length INTEGER,
            time_created INTEGER NOT NULL,
            time_updated INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_components_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS components (
            id TEXT PRIMARY KEY,
            template_id TEXT NOT NULL REFERENCES assettemplates(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            manufacturer_id TEXT,
            weight INTEGER,
            time_created INTEGER NOT NULL,
            time_updated INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_fleet_templates_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS fleetassettemplates (
            fleet_id TEXT NOT NULL REFERENCES fleets(id) ON DELETE CASCADE,
            template_id TEXT NOT NULL REFERENCES assettemplates(id) ON DELETE CASCADE,
            PRIMARY KEY (fleet_id, template_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_assets_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS assets (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            template_id TEXT NOT NULL REFERENCES assettemplates(id),
            fleet_id TEXT REFERENCES fleets(id) ON DELETE SET NULL,
            date_buy INTEGER,
            date_install INTEGER,
            warranty TEXT,
            time_created INTEGER NOT NULL,
            time_updated INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// component_id has no foreign key: deleting a component leaves its parts
pub async fn create_asset_parts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS assetparts (
            id TEXT PRIMARY KEY,
            asset_id TEXT NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
            component_id TEXT NOT NULL,
            name TEXT NOT NULL,
            serial_number TEXT,
            condition TEXT,
            notes TEXT,
            inspection_frequency INTEGER CHECK (inspection_frequency IS NULL OR inspection_frequency >= 0),
            time_created INTEGER NOT NULL,
            time_updated INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_inspections_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS inspections (
            id TEXT PRIMARY KEY,
            target_type TEXT NOT NULL CHECK (target_type IN ('Asset', 'AssetPart')),
            target_id TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            action TEXT,
            condition TEXT,
            notes TEXT,
            time_created INTEGER NOT NULL,
            time_updated INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_attachments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attachments (
            id TEXT PRIMARY KEY,
            entity_type TEXT NOT NULL CHECK (entity_type IN ('Asset', 'AssetPart', 'Inspection')),
            entity_id TEXT NOT NULL,
            uri TEXT NOT NULL,
            name TEXT NOT NULL,
            mime_type TEXT NOT NULL,
            time_created INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
