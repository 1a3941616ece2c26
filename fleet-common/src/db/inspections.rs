//! Inspection event log
//!
//! Inspections are append-mostly: condition and notes may be corrected
//! after the fact, the timestamp and target may not.

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use super::{nullable, row_exists, WriteContext};
use crate::{Error, Result};

/// Entity kinds an inspection can be recorded against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InspectionKind {
    Asset,
    AssetPart,
}

impl InspectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionKind::Asset => "Asset",
            InspectionKind::AssetPart => "AssetPart",
        }
    }
}

impl fmt::Display for InspectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InspectionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Asset" => Ok(InspectionKind::Asset),
            "AssetPart" => Ok(InspectionKind::AssetPart),
            other => Err(Error::Internal(format!(
                "unknown inspection target_type '{}' in store",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionTarget {
    #[serde(rename = "target_type")]
    pub kind: InspectionKind,
    #[serde(rename = "target_id")]
    pub id: String,
}

impl InspectionTarget {
    pub fn asset(id: impl Into<String>) -> Self {
        Self {
            kind: InspectionKind::Asset,
            id: id.into(),
        }
    }

    pub fn part(id: impl Into<String>) -> Self {
        Self {
            kind: InspectionKind::AssetPart,
            id: id.into(),
        }
    }
}

/// Inspection record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    pub id: String,
    #[serde(flatten)]
    pub target: InspectionTarget,
    /// Unix seconds at which the inspection happened (or is planned)
    pub timestamp: i64,
    pub action: Option<String>,
    pub condition: Option<String>,
    pub notes: Option<String>,
    pub time_created: i64,
    pub time_updated: i64,
}

impl Inspection {
    fn from_row(row: &SqliteRow) -> Result<Self> {
        let kind: String = row.try_get("target_type")?;
        Ok(Self {
            id: row.try_get("id")?,
            target: InspectionTarget {
                kind: kind.parse()?,
                id: row.try_get("target_id")?,
            },
            timestamp: row.try_get("timestamp")?,
            action: row.try_get("action")?,
            condition: row.try_get("condition")?,
            notes: row.try_get("notes")?,
            time_created: row.try_get("time_created")?,
            time_updated: row.try_get("time_updated")?,
        })
    }
}

/// What was observed or done during one inspection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InspectionEvent {
    pub timestamp: i64,
    pub action: Option<String>,
    pub condition: Option<String>,
    pub notes: Option<String>,
}

/// One entry of a batch log request
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct BatchEntry {
    asset_part_id: String,
    timestamp: i64,
    action: Option<String>,
    condition: Option<String>,
    notes: Option<String>,
}

/// Per-entry result of [`log_inspection_batch`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum InspectionOutcome {
    Ok { index: usize, id: String },
    Error { index: usize, error: String },
}

impl InspectionOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, InspectionOutcome::Ok { .. })
    }
}

/// Correction of a recorded inspection; `null` clears a field
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InspectionPatch {
    #[serde(default, deserialize_with = "nullable")]
    pub condition: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

const SELECT_INSPECTION: &str = r#"
    SELECT id, target_type, target_id, timestamp, action, condition, notes,
           time_created, time_updated
    FROM inspections
"#;

async fn insert_inspection(
    pool: &SqlitePool,
    ctx: WriteContext<'_>,
    target: InspectionTarget,
    event: &InspectionEvent,
) -> Result<Inspection> {
    if event.timestamp < 0 {
        return Err(Error::invalid("timestamp must not be negative"));
    }

    let inspection = Inspection {
        id: ctx.ids.next_id(),
        target,
        timestamp: event.timestamp,
        action: event.action.clone(),
        condition: event.condition.clone(),
        notes: event.notes.clone(),
        time_created: ctx.now,
        time_updated: ctx.now,
    };

    sqlx::query(
        r#"
        INSERT INTO inspections (
            id, target_type, target_id, timestamp, action, condition, notes,
            time_created, time_updated
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&inspection.id)
    .bind(inspection.target.kind.as_str())
    .bind(&inspection.target.id)
    .bind(inspection.timestamp)
    .bind(&inspection.action)
    .bind(&inspection.condition)
    .bind(&inspection.notes)
    .bind(inspection.time_created)
    .bind(inspection.time_updated)
    .execute(pool)
    .await?;

    Ok(inspection)
}

/// Plan an inspection of a whole asset
pub async fn schedule_inspection(
    pool: &SqlitePool,
    ctx: WriteContext<'_>,
    asset_id: &str,
    timestamp: i64,
) -> Result<Inspection> {
    if !row_exists(pool, "assets", asset_id).await? {
        return Err(Error::not_found("Asset", asset_id));
    }

    let inspection = insert_inspection(
        pool,
        ctx,
        InspectionTarget::asset(asset_id),
        &InspectionEvent {
            timestamp,
            ..Default::default()
        },
    )
    .await?;

    info!("Scheduled inspection {} for asset {}", inspection.id, asset_id);
    Ok(inspection)
}

/// Record one inspection of an asset part
pub async fn log_inspection(
    pool: &SqlitePool,
    ctx: WriteContext<'_>,
    part_id: &str,
    event: &InspectionEvent,
) -> Result<Inspection> {
    if !row_exists(pool, "assetparts", part_id).await? {
        return Err(Error::not_found("AssetPart", part_id));
    }

    insert_inspection(pool, ctx, InspectionTarget::part(part_id), event).await
}

/// Record many part inspections, each entry on its own
///
/// A failing entry does not affect the others; the result has exactly one
/// outcome per input entry, in input order.
pub async fn log_inspection_batch(
    pool: &SqlitePool,
    ctx: WriteContext<'_>,
    entries: Vec<serde_json::Value>,
) -> Vec<InspectionOutcome> {
    let mut outcomes = Vec::with_capacity(entries.len());

    for (index, raw) in entries.into_iter().enumerate() {
        let result = match serde_json::from_value::<BatchEntry>(raw) {
            Ok(entry) => {
                let event = InspectionEvent {
                    timestamp: entry.timestamp,
                    action: entry.action,
                    condition: entry.condition,
                    notes: entry.notes,
                };
                log_inspection(pool, ctx, &entry.asset_part_id, &event).await
            }
            Err(e) => Err(Error::invalid(e.to_string())),
        };

        match result {
            Ok(inspection) => outcomes.push(InspectionOutcome::Ok {
                index,
                id: inspection.id,
            }),
            Err(e) => {
                warn!("Batch inspection entry {} rejected: {}", index, e);
                outcomes.push(InspectionOutcome::Error {
                    index,
                    error: e.to_string(),
                });
            }
        }
    }

    let ok = outcomes.iter().filter(|o| o.is_ok()).count();
    info!("Logged {} of {} batch inspections", ok, outcomes.len());
    outcomes
}

pub async fn get_inspection(pool: &SqlitePool, inspection_id: &str) -> Result<Inspection> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_INSPECTION))
        .bind(inspection_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::not_found("Inspection", inspection_id))?;

    Inspection::from_row(&row)
}

/// Inspection history of one part, oldest first
///
/// History outlives the part, so an unknown id yields an empty list.
pub async fn list_part_inspections(pool: &SqlitePool, part_id: &str) -> Result<Vec<Inspection>> {
    let rows = sqlx::query(&format!(
        "{} WHERE target_type = 'AssetPart' AND target_id = ? ORDER BY timestamp, id",
        SELECT_INSPECTION
    ))
    .bind(part_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(Inspection::from_row).collect()
}

pub async fn update_inspection(
    pool: &SqlitePool,
    ctx: WriteContext<'_>,
    inspection_id: &str,
    patch: &InspectionPatch,
) -> Result<Inspection> {
    let result = sqlx::query(
        r#"
        UPDATE inspections SET
            condition = CASE WHEN ? THEN ? ELSE condition END,
            notes = CASE WHEN ? THEN ? ELSE notes END,
            time_updated = ?
        WHERE id = ?
        "#,
    )
    .bind(patch.condition.is_some())
    .bind(patch.condition.as_ref().and_then(Option::as_deref))
    .bind(patch.notes.is_some())
    .bind(patch.notes.as_ref().and_then(Option::as_deref))
    .bind(ctx.now)
    .bind(inspection_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("Inspection", inspection_id));
    }

    get_inspection(pool, inspection_id).await
}
