//! Database records, schema and the operations over them
//!
//! One module per component. Every write receives a [`WriteContext`]
//! carrying the id source and the request's notion of "now".

pub mod assets;
pub mod attachments;
pub mod catalog;
pub mod fleets;
pub mod init;
pub mod inspections;
pub mod migrations;
pub mod ports;
pub mod sessions;
pub mod users;

pub use init::*;
pub use migrations::*;

use crate::ids::IdSource;
use crate::{Error, Result};
use serde::{Deserialize, Deserializer};
use sqlx::SqlitePool;

/// Capabilities a write operation needs from its caller
#[derive(Clone, Copy)]
pub struct WriteContext<'a> {
    pub ids: &'a dyn IdSource,
    /// Unix seconds
    pub now: i64,
}

impl<'a> WriteContext<'a> {
    pub fn new(ids: &'a dyn IdSource, now: i64) -> Self {
        Self { ids, now }
    }
}

/// Reject blank required text fields
pub(crate) fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid(format!("{} is required", field)));
    }
    Ok(())
}

/// True when a row with `id` exists in `table`
///
/// `table` is always a compile-time constant from this crate.
pub(crate) async fn row_exists(pool: &SqlitePool, table: &str, id: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(&format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)",
        table
    ))
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Single-column id list
pub(crate) async fn id_list(pool: &SqlitePool, sql: &str, key: &str) -> Result<Vec<String>> {
    let ids: Vec<String> = sqlx::query_scalar(sql).bind(key).fetch_all(pool).await?;
    Ok(ids)
}

/// Serde helper for patch fields that may be explicitly nulled
///
/// Absent → `None`, `null` → `Some(None)`, value → `Some(Some(v))`.
/// Use with `#[serde(default, deserialize_with = "nullable")]`.
pub fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
