//! Fleets and their links to ports, templates and assets
//!
//! Unassignment is compare-and-clear: a single `UPDATE ... WHERE` that only
//! clears the reference while it still points at the given parent. When the
//! child has meanwhile moved elsewhere the statement touches no row and the
//! call is a successful no-op.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use super::{id_list, require_text, row_exists, WriteContext};
use crate::{Error, Result};

/// Fleet record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Fleet {
    pub id: String,
    pub name: String,
    pub description: String,
    pub port_id: Option<String>,
    pub time_created: i64,
    pub time_updated: i64,
}

/// Fields for a new fleet
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewFleet {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "port")]
    pub port_id: Option<String>,
}

pub async fn create_fleet(pool: &SqlitePool, ctx: WriteContext<'_>, new: &NewFleet) -> Result<Fleet> {
    require_text("name", &new.name)?;

    if let Some(port_id) = &new.port_id {
        if !row_exists(pool, "ports", port_id).await? {
            return Err(Error::invalid(format!("port {} does not exist", port_id)));
        }
    }

    let fleet = Fleet {
        id: ctx.ids.next_id(),
        name: new.name.trim().to_string(),
        description: new.description.clone(),
        port_id: new.port_id.clone(),
        time_created: ctx.now,
        time_updated: ctx.now,
    };

    sqlx::query(
        r#"
        INSERT INTO fleets (id, name, description, port_id, time_created, time_updated)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&fleet.id)
    .bind(&fleet.name)
    .bind(&fleet.description)
    .bind(&fleet.port_id)
    .bind(fleet.time_created)
    .bind(fleet.time_updated)
    .execute(pool)
    .await?;

    Ok(fleet)
}

pub async fn get_fleet(pool: &SqlitePool, fleet_id: &str) -> Result<Fleet> {
    sqlx::query_as::<_, Fleet>(
        "SELECT id, name, description, port_id, time_created, time_updated FROM fleets WHERE id = ?",
    )
    .bind(fleet_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::not_found("Fleet", fleet_id))
}

pub async fn fleet_template_ids(pool: &SqlitePool, fleet_id: &str) -> Result<Vec<String>> {
    id_list(
        pool,
        "SELECT template_id FROM fleetassettemplates WHERE fleet_id = ? ORDER BY template_id",
        fleet_id,
    )
    .await
}

pub async fn fleet_asset_ids(pool: &SqlitePool, fleet_id: &str) -> Result<Vec<String>> {
    id_list(pool, "SELECT id FROM assets WHERE fleet_id = ? ORDER BY id", fleet_id).await
}

/// Base a fleet at a port (moving it if already based elsewhere)
pub async fn assign_fleet_to_port(
    pool: &SqlitePool,
    ctx: WriteContext<'_>,
    fleet_id: &str,
    port_id: &str,
) -> Result<()> {
    if !row_exists(pool, "ports", port_id).await? {
        return Err(Error::not_found("Port", port_id));
    }

    let result = sqlx::query("UPDATE fleets SET port_id = ?, time_updated = ? WHERE id = ?")
        .bind(port_id)
        .bind(ctx.now)
        .bind(fleet_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("Fleet", fleet_id));
    }
    Ok(())
}

/// Clear a fleet's port only if it is still `port_id`
///
/// Returns whether a row changed.
pub async fn unassign_fleet_from_port(
    pool: &SqlitePool,
    ctx: WriteContext<'_>,
    fleet_id: &str,
    port_id: &str,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE fleets SET port_id = NULL, time_updated = ? WHERE id = ? AND port_id = ?",
    )
    .bind(ctx.now)
    .bind(fleet_id)
    .bind(port_id)
    .execute(pool)
    .await?;

    let cleared = result.rows_affected() > 0;
    if !cleared {
        debug!("Fleet {} is not at port {}; nothing to unassign", fleet_id, port_id);
    }
    Ok(cleared)
}

/// Link a template to a fleet; linking twice is a no-op
pub async fn associate_template(pool: &SqlitePool, fleet_id: &str, template_id: &str) -> Result<()> {
    if !row_exists(pool, "fleets", fleet_id).await? {
        return Err(Error::not_found("Fleet", fleet_id));
    }
    if !row_exists(pool, "assettemplates", template_id).await? {
        return Err(Error::not_found("AssetTemplate", template_id));
    }

    sqlx::query("INSERT OR IGNORE INTO fleetassettemplates (fleet_id, template_id) VALUES (?, ?)")
        .bind(fleet_id)
        .bind(template_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Unlink a template from a fleet; removing a missing link is a no-op
pub async fn dissociate_template(pool: &SqlitePool, fleet_id: &str, template_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM fleetassettemplates WHERE fleet_id = ? AND template_id = ?")
        .bind(fleet_id)
        .bind(template_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Put an asset in a fleet (moving it if already in another)
pub async fn assign_asset_to_fleet(
    pool: &SqlitePool,
    ctx: WriteContext<'_>,
    fleet_id: &str,
    asset_id: &str,
) -> Result<()> {
    if !row_exists(pool, "fleets", fleet_id).await? {
        return Err(Error::not_found("Fleet", fleet_id));
    }

    let result = sqlx::query("UPDATE assets SET fleet_id = ?, time_updated = ? WHERE id = ?")
        .bind(fleet_id)
        .bind(ctx.now)
        .bind(asset_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("Asset", asset_id));
    }
    Ok(())
}

/// Clear an asset's fleet only if it is still `fleet_id`
pub async fn unassign_asset_from_fleet(
    pool: &SqlitePool,
    ctx: WriteContext<'_>,
    fleet_id: &str,
    asset_id: &str,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE assets SET fleet_id = NULL, time_updated = ? WHERE id = ? AND fleet_id = ?",
    )
    .bind(ctx.now)
    .bind(asset_id)
    .bind(fleet_id)
    .execute(pool)
    .await?;

    let cleared = result.rows_affected() > 0;
    if !cleared {
        debug!("Asset {} is not in fleet {}; nothing to unassign", asset_id, fleet_id);
    }
    Ok(cleared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::assets::{create_asset, get_asset, NewAsset};
    use crate::db::catalog::{create_asset_template, NewAssetTemplate};
    use crate::db::init::init_memory_database;
    use crate::db::ports::{create_port, port_fleet_ids, NewPort};
    use crate::ids::SequentialIds;

    fn new_port(name: &str) -> NewPort {
        NewPort {
            name: name.to_string(),
            location_lat: 0.0,
            location_lng: 0.0,
            location_elevation: 0.0,
        }
    }

    fn new_fleet(name: &str) -> NewFleet {
        NewFleet {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_fleet_round_trip() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("f-");
        let ctx = WriteContext::new(&ids, 10);

        let fleet = create_fleet(
            &pool,
            ctx,
            &NewFleet {
                name: "Alpha".to_string(),
                description: "d".to_string(),
                port_id: None,
            },
        )
        .await
        .unwrap();

        let loaded = get_fleet(&pool, &fleet.id).await.unwrap();
        assert_eq!(loaded.name, "Alpha");
        assert_eq!(loaded.description, "d");
        assert_eq!(loaded.port_id, None);
        assert!(fleet_template_ids(&pool, &fleet.id).await.unwrap().is_empty());
        assert!(fleet_asset_ids(&pool, &fleet.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_fleet_requires_name_and_known_port() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("f-");
        let ctx = WriteContext::new(&ids, 10);

        let blank = create_fleet(&pool, ctx, &new_fleet("")).await;
        assert!(matches!(blank, Err(Error::InvalidInput(_))));

        let mut dangling = new_fleet("Beta");
        dangling.port_id = Some("missing".to_string());
        assert!(matches!(create_fleet(&pool, ctx, &dangling).await, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_unassign_from_port_is_compare_and_clear() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("x-");
        let ctx = WriteContext::new(&ids, 10);

        let north = create_port(&pool, ctx, &new_port("North")).await.unwrap();
        let south = create_port(&pool, ctx, &new_port("South")).await.unwrap();
        let fleet = create_fleet(&pool, ctx, &new_fleet("Alpha")).await.unwrap();

        assign_fleet_to_port(&pool, ctx, &fleet.id, &north.id).await.unwrap();
        assert_eq!(port_fleet_ids(&pool, &north.id).await.unwrap(), vec![fleet.id.clone()]);

        // Fleet moves; a stale unassign from North must not clear South
        assign_fleet_to_port(&pool, ctx, &fleet.id, &south.id).await.unwrap();
        let cleared = unassign_fleet_from_port(&pool, ctx, &fleet.id, &north.id).await.unwrap();
        assert!(!cleared);
        assert_eq!(get_fleet(&pool, &fleet.id).await.unwrap().port_id, Some(south.id.clone()));

        let cleared = unassign_fleet_from_port(&pool, ctx, &fleet.id, &south.id).await.unwrap();
        assert!(cleared);
        assert_eq!(get_fleet(&pool, &fleet.id).await.unwrap().port_id, None);
        assert!(port_fleet_ids(&pool, &south.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_assign_to_missing_port_or_fleet() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("x-");
        let ctx = WriteContext::new(&ids, 10);
        let port = create_port(&pool, ctx, &new_port("North")).await.unwrap();
        let fleet = create_fleet(&pool, ctx, &new_fleet("Alpha")).await.unwrap();

        assert!(matches!(
            assign_fleet_to_port(&pool, ctx, &fleet.id, "nope").await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            assign_fleet_to_port(&pool, ctx, "nope", &port.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_template_association_is_idempotent() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("x-");
        let ctx = WriteContext::new(&ids, 10);
        let fleet = create_fleet(&pool, ctx, &new_fleet("Alpha")).await.unwrap();
        let template = create_asset_template(
            &pool,
            ctx,
            &NewAssetTemplate {
                name: "Quad X4".to_string(),
                manufacturer_id: "ACME".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        associate_template(&pool, &fleet.id, &template.id).await.unwrap();
        associate_template(&pool, &fleet.id, &template.id).await.unwrap();
        assert_eq!(fleet_template_ids(&pool, &fleet.id).await.unwrap(), vec![template.id.clone()]);

        dissociate_template(&pool, &fleet.id, &template.id).await.unwrap();
        dissociate_template(&pool, &fleet.id, &template.id).await.unwrap();
        assert!(fleet_template_ids(&pool, &fleet.id).await.unwrap().is_empty());

        assert!(matches!(
            associate_template(&pool, &fleet.id, "nope").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_asset_fleet_assignment() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("x-");
        let ctx = WriteContext::new(&ids, 10);
        let alpha = create_fleet(&pool, ctx, &new_fleet("Alpha")).await.unwrap();
        let bravo = create_fleet(&pool, ctx, &new_fleet("Bravo")).await.unwrap();
        let template = create_asset_template(
            &pool,
            ctx,
            &NewAssetTemplate {
                name: "Quad X4".to_string(),
                manufacturer_id: "ACME".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let asset = create_asset(
            &pool,
            ctx,
            &NewAsset {
                name: "Drone A".to_string(),
                template_id: template.id.clone(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assign_asset_to_fleet(&pool, ctx, &alpha.id, &asset.id).await.unwrap();
        assert_eq!(fleet_asset_ids(&pool, &alpha.id).await.unwrap(), vec![asset.id.clone()]);

        assign_asset_to_fleet(&pool, ctx, &bravo.id, &asset.id).await.unwrap();
        assert!(!unassign_asset_from_fleet(&pool, ctx, &alpha.id, &asset.id).await.unwrap());
        assert_eq!(get_asset(&pool, &asset.id).await.unwrap().fleet_id, Some(bravo.id.clone()));

        assert!(unassign_asset_from_fleet(&pool, ctx, &bravo.id, &asset.id).await.unwrap());
        assert_eq!(get_asset(&pool, &asset.id).await.unwrap().fleet_id, None);

        assert!(matches!(
            assign_asset_to_fleet(&pool, ctx, &alpha.id, "nope").await,
            Err(Error::NotFound(_))
        ));
    }
}
