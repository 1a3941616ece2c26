//! Maintenance compliance derived from the inspection log
//!
//! Nothing here is stored. Every call reads the current frequency policy of
//! each part and the latest inspection timestamp, then computes whole days
//! elapsed against `now`. A part never inspected is measured from the
//! moment it was created.

use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::db::fleets::get_fleet;
use crate::time::whole_days_between;
use crate::Result;

/// Overdue status of every asset in a fleet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetCompliance {
    pub fleet_id: String,
    pub assets_with_overdue_parts: Vec<AssetCompliance>,
}

/// One asset with at least one overdue part
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetCompliance {
    pub asset_id: String,
    pub asset_name: String,
    pub overdue_parts: Vec<OverduePart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverduePart {
    pub part_id: String,
    pub part_name: String,
    /// Unix seconds of the latest inspection; `None` if never inspected
    pub last_inspection_time: Option<i64>,
    pub inspection_frequency: i64,
    pub days_overdue: i64,
}

#[derive(Debug, FromRow)]
struct PartPolicyRow {
    asset_id: String,
    asset_name: String,
    part_id: String,
    part_name: String,
    inspection_frequency: i64,
    time_created: i64,
    last_inspection: Option<i64>,
}

/// Days a part is overdue, or `None` if it is compliant
///
/// Overdue iff whole days elapsed since the baseline exceed `frequency`.
/// The baseline is the latest inspection, else `created_at`.
pub fn days_overdue(frequency: i64, last_inspection: Option<i64>, created_at: i64, now: i64) -> Option<i64> {
    let baseline = last_inspection.unwrap_or(created_at);
    let elapsed = whole_days_between(baseline, now);
    (elapsed > frequency).then(|| elapsed - frequency)
}

/// Derive the overdue parts of every asset currently in `fleet_id`
pub async fn compute_overdue_parts(pool: &SqlitePool, fleet_id: &str, now: i64) -> Result<FleetCompliance> {
    let fleet = get_fleet(pool, fleet_id).await?;

    let rows = sqlx::query_as::<_, PartPolicyRow>(
        r#"
        SELECT a.id AS asset_id, a.name AS asset_name,
               p.id AS part_id, p.name AS part_name,
               p.inspection_frequency, p.time_created,
               (SELECT MAX(i.timestamp) FROM inspections i
                WHERE i.target_type = 'AssetPart' AND i.target_id = p.id) AS last_inspection
        FROM assets a
        JOIN assetparts p ON p.asset_id = a.id
        WHERE a.fleet_id = ? AND p.inspection_frequency IS NOT NULL
        ORDER BY a.id, p.id
        "#,
    )
    .bind(&fleet.id)
    .fetch_all(pool)
    .await?;

    debug!("Evaluating {} scheduled parts in fleet {}", rows.len(), fleet.id);

    let mut assets: Vec<AssetCompliance> = Vec::new();
    for row in rows {
        let Some(overdue) = days_overdue(row.inspection_frequency, row.last_inspection, row.time_created, now)
        else {
            continue;
        };

        let part = OverduePart {
            part_id: row.part_id,
            part_name: row.part_name,
            last_inspection_time: row.last_inspection,
            inspection_frequency: row.inspection_frequency,
            days_overdue: overdue,
        };

        match assets.last_mut() {
            Some(asset) if asset.asset_id == row.asset_id => asset.overdue_parts.push(part),
            _ => assets.push(AssetCompliance {
                asset_id: row.asset_id,
                asset_name: row.asset_name,
                overdue_parts: vec![part],
            }),
        }
    }

    Ok(FleetCompliance {
        fleet_id: fleet.id,
        assets_with_overdue_parts: assets,
    })
}
