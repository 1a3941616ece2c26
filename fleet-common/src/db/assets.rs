//! Assets (physical units) and their installed parts
//!
//! An asset is instantiated from one template. Each of its parts references
//! a component that must belong to that same template at creation time.
//! Parts outlive the deletion of their component definition.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::info;

use super::attachments::{attachment_uris, AttachmentKind, AttachmentOwner};
use super::catalog::{get_component, list_template_components, Component};
use super::{nullable, require_text, row_exists, WriteContext};
use crate::{Error, Result};

/// Asset record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub template_id: String,
    pub fleet_id: Option<String>,
    pub date_buy: Option<i64>,
    pub date_install: Option<i64>,
    pub warranty: Option<String>,
    pub time_created: i64,
    pub time_updated: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAsset {
    pub name: String,
    #[serde(alias = "template")]
    pub template_id: String,
    #[serde(default, alias = "fleet")]
    pub fleet_id: Option<String>,
    pub date_buy: Option<i64>,
    pub date_install: Option<i64>,
    pub warranty: Option<String>,
}

/// Asset part record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AssetPart {
    pub id: String,
    pub asset_id: String,
    pub component_id: String,
    pub name: String,
    pub serial_number: Option<String>,
    pub condition: Option<String>,
    pub notes: Option<String>,
    /// Days between required inspections; `None` exempts the part
    pub inspection_frequency: Option<i64>,
    pub time_created: i64,
    pub time_updated: i64,
}

/// New part; without `component_id` the component is matched by `name`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAssetPart {
    pub component_id: Option<String>,
    pub name: Option<String>,
    pub serial_number: Option<String>,
    pub condition: Option<String>,
    pub notes: Option<String>,
    pub inspection_frequency: Option<i64>,
}

/// Partial part update; asset and component links are fixed
///
/// Optional fields accept `null` to clear a stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetPartPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub serial_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub condition: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
    /// `null` exempts the part from compliance
    #[serde(default, deserialize_with = "nullable")]
    pub inspection_frequency: Option<Option<i64>>,
}

/// Part plus the URIs attached to it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartWithAttachments {
    #[serde(flatten)]
    pub part: AssetPart,
    pub attachments: Vec<String>,
}

/// Asset with its parts and all attachment URIs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetDetail {
    pub asset: Asset,
    pub attachments: Vec<String>,
    pub parts: Vec<PartWithAttachments>,
}

fn validate_frequency(frequency: Option<i64>) -> Result<()> {
    match frequency {
        Some(days) if days < 0 => Err(Error::invalid("inspection_frequency must not be negative")),
        _ => Ok(()),
    }
}

pub async fn create_asset(pool: &SqlitePool, ctx: WriteContext<'_>, new: &NewAsset) -> Result<Asset> {
    require_text("name", &new.name)?;
    require_text("template_id", &new.template_id)?;

    if !row_exists(pool, "assettemplates", &new.template_id).await? {
        return Err(Error::invalid(format!(
            "template {} does not exist",
            new.template_id
        )));
    }
    if let Some(fleet_id) = &new.fleet_id {
        if !row_exists(pool, "fleets", fleet_id).await? {
            return Err(Error::invalid(format!("fleet {} does not exist", fleet_id)));
        }
    }

    let asset = Asset {
        id: ctx.ids.next_id(),
        name: new.name.trim().to_string(),
        template_id: new.template_id.clone(),
        fleet_id: new.fleet_id.clone(),
        date_buy: new.date_buy,
        date_install: new.date_install,
        warranty: new.warranty.clone(),
        time_created: ctx.now,
        time_updated: ctx.now,
    };

    sqlx::query(
        r#"
        INSERT INTO assets (
            id, name, template_id, fleet_id, date_buy, date_install, warranty,
            time_created, time_updated
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&asset.id)
    .bind(&asset.name)
    .bind(&asset.template_id)
    .bind(&asset.fleet_id)
    .bind(asset.date_buy)
    .bind(asset.date_install)
    .bind(&asset.warranty)
    .bind(asset.time_created)
    .bind(asset.time_updated)
    .execute(pool)
    .await?;

    Ok(asset)
}

pub async fn get_asset(pool: &SqlitePool, asset_id: &str) -> Result<Asset> {
    sqlx::query_as::<_, Asset>(
        r#"
        SELECT id, name, template_id, fleet_id, date_buy, date_install, warranty,
               time_created, time_updated
        FROM assets WHERE id = ?
        "#,
    )
    .bind(asset_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::not_found("Asset", asset_id))
}

pub async fn list_asset_parts(pool: &SqlitePool, asset_id: &str) -> Result<Vec<AssetPart>> {
    let parts = sqlx::query_as::<_, AssetPart>(
        r#"
        SELECT id, asset_id, component_id, name, serial_number, condition, notes,
               inspection_frequency, time_created, time_updated
        FROM assetparts WHERE asset_id = ? ORDER BY id
        "#,
    )
    .bind(asset_id)
    .fetch_all(pool)
    .await?;

    Ok(parts)
}

/// Asset, its parts, and the attachments of both
pub async fn get_asset_detail(pool: &SqlitePool, asset_id: &str) -> Result<AssetDetail> {
    let asset = get_asset(pool, asset_id).await?;
    let attachments = attachment_uris(
        pool,
        &AttachmentOwner::new(AttachmentKind::Asset, asset_id),
    )
    .await?;

    let mut parts = Vec::new();
    for part in list_asset_parts(pool, asset_id).await? {
        let attachments = attachment_uris(
            pool,
            &AttachmentOwner::new(AttachmentKind::AssetPart, part.id.as_str()),
        )
        .await?;
        parts.push(PartWithAttachments { part, attachments });
    }

    Ok(AssetDetail {
        asset,
        attachments,
        parts,
    })
}

/// Resolve the component a new part instantiates
async fn resolve_component(pool: &SqlitePool, asset: &Asset, new: &NewAssetPart) -> Result<Component> {
    if let Some(component_id) = &new.component_id {
        let component = match get_component(pool, component_id).await {
            Ok(component) => component,
            Err(Error::NotFound(_)) => {
                return Err(Error::invalid(format!(
                    "component {} does not exist",
                    component_id
                )))
            }
            Err(e) => return Err(e),
        };

        if component.template_id != asset.template_id {
            return Err(Error::invalid(format!(
                "component {} belongs to template {}, not to asset template {}",
                component.id, component.template_id, asset.template_id
            )));
        }
        return Ok(component);
    }

    let name = new
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::invalid("component_id or name is required"))?;

    let mut matches: Vec<Component> = list_template_components(pool, &asset.template_id)
        .await?
        .into_iter()
        .filter(|c| c.name == name)
        .collect();

    match matches.len() {
        1 => Ok(matches.remove(0)),
        0 => Err(Error::invalid(format!(
            "template {} has no component named '{}'",
            asset.template_id, name
        ))),
        _ => Err(Error::invalid(format!(
            "template {} has several components named '{}'; pass component_id",
            asset.template_id, name
        ))),
    }
}

pub async fn create_asset_part(
    pool: &SqlitePool,
    ctx: WriteContext<'_>,
    asset_id: &str,
    new: &NewAssetPart,
) -> Result<AssetPart> {
    validate_frequency(new.inspection_frequency)?;

    let asset = get_asset(pool, asset_id).await?;
    let component = resolve_component(pool, &asset, new).await?;

    let name = new
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(component.name.as_str())
        .to_string();

    let part = AssetPart {
        id: ctx.ids.next_id(),
        asset_id: asset.id,
        component_id: component.id,
        name,
        serial_number: new.serial_number.clone(),
        condition: new.condition.clone(),
        notes: new.notes.clone(),
        inspection_frequency: new.inspection_frequency,
        time_created: ctx.now,
        time_updated: ctx.now,
    };

    insert_part(pool, &part).await?;
    Ok(part)
}

async fn insert_part<'e, E>(executor: E, part: &AssetPart) -> Result<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO assetparts (
            id, asset_id, component_id, name, serial_number, condition, notes,
            inspection_frequency, time_created, time_updated
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&part.id)
    .bind(&part.asset_id)
    .bind(&part.component_id)
    .bind(&part.name)
    .bind(&part.serial_number)
    .bind(&part.condition)
    .bind(&part.notes)
    .bind(part.inspection_frequency)
    .bind(part.time_created)
    .bind(part.time_updated)
    .execute(executor)
    .await?;

    Ok(())
}

/// Create one part per template component the asset does not have yet
///
/// All-or-nothing: runs in one transaction. Each insert re-checks for an
/// existing part in the same statement, so concurrent calls never
/// duplicate a component.
pub async fn populate_asset_parts(
    pool: &SqlitePool,
    ctx: WriteContext<'_>,
    asset_id: &str,
) -> Result<Vec<AssetPart>> {
    let asset = get_asset(pool, asset_id).await?;
    let components = list_template_components(pool, &asset.template_id).await?;

    let mut tx = pool.begin().await?;
    let mut created = Vec::new();
    for component in components {
        let part = AssetPart {
            id: ctx.ids.next_id(),
            asset_id: asset.id.clone(),
            component_id: component.id,
            name: component.name,
            serial_number: None,
            condition: None,
            notes: None,
            inspection_frequency: None,
            time_created: ctx.now,
            time_updated: ctx.now,
        };

        let result = sqlx::query(
            r#"
            INSERT INTO assetparts (
                id, asset_id, component_id, name, inspection_frequency,
                time_created, time_updated
            )
            SELECT ?, ?, ?, ?, NULL, ?, ?
            WHERE NOT EXISTS (
                SELECT 1 FROM assetparts WHERE asset_id = ? AND component_id = ?
            )
            "#,
        )
        .bind(&part.id)
        .bind(&part.asset_id)
        .bind(&part.component_id)
        .bind(&part.name)
        .bind(part.time_created)
        .bind(part.time_updated)
        .bind(&part.asset_id)
        .bind(&part.component_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() > 0 {
            created.push(part);
        }
    }
    tx.commit().await?;

    info!("Populated {} parts on asset {}", created.len(), asset_id);
    Ok(created)
}

pub async fn get_asset_part(pool: &SqlitePool, part_id: &str) -> Result<AssetPart> {
    sqlx::query_as::<_, AssetPart>(
        r#"
        SELECT id, asset_id, component_id, name, serial_number, condition, notes,
               inspection_frequency, time_created, time_updated
        FROM assetparts WHERE id = ?
        "#,
    )
    .bind(part_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::not_found("AssetPart", part_id))
}

/// Apply a partial update in one statement
pub async fn update_asset_part(
    pool: &SqlitePool,
    ctx: WriteContext<'_>,
    part_id: &str,
    patch: &AssetPartPatch,
) -> Result<AssetPart> {
    if let Some(name) = &patch.name {
        require_text("name", name)?;
    }
    if let Some(frequency) = patch.inspection_frequency {
        validate_frequency(frequency)?;
    }

    let result = sqlx::query(
        r#"
        UPDATE assetparts SET
            name = COALESCE(?, name),
            serial_number = CASE WHEN ? THEN ? ELSE serial_number END,
            condition = CASE WHEN ? THEN ? ELSE condition END,
            notes = CASE WHEN ? THEN ? ELSE notes END,
            inspection_frequency = CASE WHEN ? THEN ? ELSE inspection_frequency END,
            time_updated = ?
        WHERE id = ?
        "#,
    )
    .bind(patch.name.as_deref().map(str::trim))
    .bind(patch.serial_number.is_some())
    .bind(patch.serial_number.as_ref().and_then(Option::as_deref))
    .bind(patch.condition.is_some())
    .bind(patch.condition.as_ref().and_then(Option::as_deref))
    .bind(patch.notes.is_some())
    .bind(patch.notes.as_ref().and_then(Option::as_deref))
    .bind(patch.inspection_frequency.is_some())
    .bind(patch.inspection_frequency.flatten())
    .bind(ctx.now)
    .bind(part_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("AssetPart", part_id));
    }

    get_asset_part(pool, part_id).await
}

/// Delete a part; its inspection log and attachments are left as history
pub async fn delete_asset_part(pool: &SqlitePool, part_id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM assetparts WHERE id = ?")
        .bind(part_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("AssetPart", part_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::attachments::{add_attachment, NewAttachment};
    use crate::db::catalog::{
        create_asset_template, create_component, delete_component, AssetTemplate, NewAssetTemplate,
        NewComponent,
    };
    use crate::db::init::init_memory_database;
    use crate::ids::SequentialIds;

    async fn template_with(pool: &SqlitePool, ctx: WriteContext<'_>, components: &[&str]) -> (AssetTemplate, Vec<Component>) {
        let template = create_asset_template(
            pool,
            ctx,
            &NewAssetTemplate {
                name: "Quad X4".to_string(),
                manufacturer_id: "ACME".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let mut created = Vec::new();
        for name in components {
            created.push(
                create_component(
                    pool,
                    ctx,
                    &template.id,
                    &NewComponent {
                        name: name.to_string(),
                        ..Default::default()
                    },
                )
                .await
                .unwrap(),
            );
        }
        (template, created)
    }

    async fn asset_of(pool: &SqlitePool, ctx: WriteContext<'_>, template_id: &str) -> Asset {
        create_asset(
            pool,
            ctx,
            &NewAsset {
                name: "Drone A".to_string(),
                template_id: template_id.to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_asset_requires_existing_template() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("a-");
        let result = create_asset(
            &pool,
            WriteContext::new(&ids, 1),
            &NewAsset {
                name: "Drone A".to_string(),
                template_id: "nope".to_string(),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(matches!(get_asset(&pool, "nope").await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_part_must_use_component_of_asset_template() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("a-");
        let ctx = WriteContext::new(&ids, 1);
        let (quad, quad_parts) = template_with(&pool, ctx, &["Rotor"]).await;
        let (_, hex_parts) = template_with(&pool, ctx, &["Rotor"]).await;
        let asset = asset_of(&pool, ctx, &quad.id).await;

        let foreign = create_asset_part(
            &pool,
            ctx,
            &asset.id,
            &NewAssetPart {
                component_id: Some(hex_parts[0].id.clone()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(foreign, Err(Error::InvalidInput(_))));

        let part = create_asset_part(
            &pool,
            ctx,
            &asset.id,
            &NewAssetPart {
                component_id: Some(quad_parts[0].id.clone()),
                serial_number: Some("SN-1".to_string()),
                inspection_frequency: Some(30),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(part.name, "Rotor");
        assert_eq!(part.inspection_frequency, Some(30));

        let missing_asset = create_asset_part(&pool, ctx, "nope", &NewAssetPart::default()).await;
        assert!(matches!(missing_asset, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_part_component_resolved_by_name() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("a-");
        let ctx = WriteContext::new(&ids, 1);
        let (template, components) = template_with(&pool, ctx, &["Rotor", "Battery", "Camera", "Camera"]).await;
        let asset = asset_of(&pool, ctx, &template.id).await;

        let battery = create_asset_part(
            &pool,
            ctx,
            &asset.id,
            &NewAssetPart {
                name: Some("Battery".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(battery.component_id, components[1].id);

        let ambiguous = create_asset_part(
            &pool,
            ctx,
            &asset.id,
            &NewAssetPart {
                name: Some("Camera".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(ambiguous, Err(Error::InvalidInput(_))));

        let unknown = create_asset_part(
            &pool,
            ctx,
            &asset.id,
            &NewAssetPart {
                name: Some("Winch".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(unknown, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_negative_frequency_rejected() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("a-");
        let ctx = WriteContext::new(&ids, 1);
        let (template, components) = template_with(&pool, ctx, &["Rotor"]).await;
        let asset = asset_of(&pool, ctx, &template.id).await;

        let result = create_asset_part(
            &pool,
            ctx,
            &asset.id,
            &NewAssetPart {
                component_id: Some(components[0].id.clone()),
                inspection_frequency: Some(-1),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_partial_part_update() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("a-");
        let ctx = WriteContext::new(&ids, 1);
        let (template, components) = template_with(&pool, ctx, &["Rotor"]).await;
        let asset = asset_of(&pool, ctx, &template.id).await;
        let part = create_asset_part(
            &pool,
            ctx,
            &asset.id,
            &NewAssetPart {
                component_id: Some(components[0].id.clone()),
                serial_number: Some("SN-1".to_string()),
                condition: Some("new".to_string()),
                inspection_frequency: Some(30),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let later = WriteContext::new(&ids, 99);
        let patch: AssetPartPatch = serde_json::from_str(r#"{"condition": "worn"}"#).unwrap();
        let updated = update_asset_part(&pool, later, &part.id, &patch).await.unwrap();
        assert_eq!(updated.condition.as_deref(), Some("worn"));
        assert_eq!(updated.serial_number.as_deref(), Some("SN-1"));
        assert_eq!(updated.inspection_frequency, Some(30));
        assert_eq!(updated.time_updated, 99);

        let patch: AssetPartPatch = serde_json::from_str(r#"{"inspection_frequency": 14}"#).unwrap();
        let updated = update_asset_part(&pool, later, &part.id, &patch).await.unwrap();
        assert_eq!(updated.inspection_frequency, Some(14));

        let patch: AssetPartPatch = serde_json::from_str(r#"{"inspection_frequency": null}"#).unwrap();
        let updated = update_asset_part(&pool, later, &part.id, &patch).await.unwrap();
        assert_eq!(updated.inspection_frequency, None);

        let patch: AssetPartPatch =
            serde_json::from_str(r#"{"serial_number": null, "notes": "rebuilt"}"#).unwrap();
        let updated = update_asset_part(&pool, later, &part.id, &patch).await.unwrap();
        assert_eq!(updated.serial_number, None);
        assert_eq!(updated.notes.as_deref(), Some("rebuilt"));
        assert_eq!(updated.condition.as_deref(), Some("worn"));

        let relink = serde_json::from_str::<AssetPartPatch>(r#"{"component_id": "x"}"#);
        assert!(relink.is_err());
    }

    #[tokio::test]
    async fn test_populate_and_detail() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("a-");
        let ctx = WriteContext::new(&ids, 1);
        let (template, components) = template_with(&pool, ctx, &["Rotor", "Battery"]).await;
        let asset = asset_of(&pool, ctx, &template.id).await;

        create_asset_part(
            &pool,
            ctx,
            &asset.id,
            &NewAssetPart {
                component_id: Some(components[0].id.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let created = populate_asset_parts(&pool, ctx, &asset.id).await.unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].component_id, components[1].id);
        assert!(populate_asset_parts(&pool, ctx, &asset.id).await.unwrap().is_empty());

        add_attachment(
            &pool,
            ctx,
            &NewAttachment {
                entity_type: "AssetPart".to_string(),
                entity_id: created[0].id.clone(),
                uri: "s3://b/battery.pdf".to_string(),
                name: "battery.pdf".to_string(),
                mime_type: "application/pdf".to_string(),
            },
        )
        .await
        .unwrap();

        let detail = get_asset_detail(&pool, &asset.id).await.unwrap();
        assert_eq!(detail.asset, asset);
        assert!(detail.attachments.is_empty());
        assert_eq!(detail.parts.len(), 2);
        let battery = detail
            .parts
            .iter()
            .find(|p| p.part.id == created[0].id)
            .unwrap();
        assert_eq!(battery.attachments, vec!["s3://b/battery.pdf"]);
    }

    #[tokio::test]
    async fn test_orphaned_part_survives_component_deletion() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("a-");
        let ctx = WriteContext::new(&ids, 1);
        let (template, components) = template_with(&pool, ctx, &["Rotor"]).await;
        let asset = asset_of(&pool, ctx, &template.id).await;
        let part = create_asset_part(
            &pool,
            ctx,
            &asset.id,
            &NewAssetPart {
                component_id: Some(components[0].id.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        delete_component(&pool, &components[0].id).await.unwrap();

        let detail = get_asset_detail(&pool, &asset.id).await.unwrap();
        assert_eq!(detail.parts.len(), 1);
        assert_eq!(detail.parts[0].part.component_id, components[0].id);

        delete_asset_part(&pool, &part.id).await.unwrap();
        assert!(matches!(delete_asset_part(&pool, &part.id).await, Err(Error::NotFound(_))));
    }
}
