//! Port records (operating bases)

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::{id_list, require_text, WriteContext};
use crate::{Error, Result};

/// Port record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Port {
    pub id: String,
    pub name: String,
    pub location_lat: f64,
    pub location_lng: f64,
    pub location_elevation: f64,
    pub time_created: i64,
    pub time_updated: i64,
}

/// Fields for a new port
#[derive(Debug, Clone, Deserialize)]
pub struct NewPort {
    pub name: String,
    pub location_lat: f64,
    pub location_lng: f64,
    pub location_elevation: f64,
}

impl NewPort {
    fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        if !(-90.0..=90.0).contains(&self.location_lat) {
            return Err(Error::invalid("location_lat must be within [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&self.location_lng) {
            return Err(Error::invalid("location_lng must be within [-180, 180]"));
        }
        if !self.location_elevation.is_finite() {
            return Err(Error::invalid("location_elevation must be a finite number"));
        }
        Ok(())
    }
}

pub async fn create_port(pool: &SqlitePool, ctx: WriteContext<'_>, new: &NewPort) -> Result<Port> {
    new.validate()?;

    let port = Port {
        id: ctx.ids.next_id(),
        name: new.name.trim().to_string(),
        location_lat: new.location_lat,
        location_lng: new.location_lng,
        location_elevation: new.location_elevation,
        time_created: ctx.now,
        time_updated: ctx.now,
    };

    sqlx::query(
        r#"
        INSERT INTO ports (id, name, location_lat, location_lng, location_elevation, time_created, time_updated)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&port.id)
    .bind(&port.name)
    .bind(port.location_lat)
    .bind(port.location_lng)
    .bind(port.location_elevation)
    .bind(port.time_created)
    .bind(port.time_updated)
    .execute(pool)
    .await?;

    Ok(port)
}

pub async fn get_port(pool: &SqlitePool, port_id: &str) -> Result<Port> {
    sqlx::query_as::<_, Port>(
        r#"
        SELECT id, name, location_lat, location_lng, location_elevation, time_created, time_updated
        FROM ports WHERE id = ?
        "#,
    )
    .bind(port_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::not_found("Port", port_id))
}

/// Ids of the fleets currently based at a port
pub async fn port_fleet_ids(pool: &SqlitePool, port_id: &str) -> Result<Vec<String>> {
    id_list(pool, "SELECT id FROM fleets WHERE port_id = ? ORDER BY id", port_id).await
}
