//! Equipment catalog: asset templates and their components
//!
//! A template is the bill of materials for one model of equipment. A
//! component belongs to exactly one template for its whole life; updates
//! cannot move it.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::{id_list, require_text, row_exists, WriteContext};
use crate::{Error, Result};

/// Asset template record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AssetTemplate {
    pub id: String,
    pub name: String,
    pub manufacturer_id: String,
    pub product_weight: Option<i64>,
    pub product_width: Option<i64>,
    pub product_height: Option<i64>,
    pub product_length: Option<i64>,
    pub time_created: i64,
    pub time_updated: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAssetTemplate {
    pub name: String,
    pub manufacturer_id: String,
    pub product_weight: Option<i64>,
    pub product_width: Option<i64>,
    pub product_height: Option<i64>,
    pub product_length: Option<i64>,
}

/// Partial template update; absent fields keep their value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetTemplatePatch {
    pub name: Option<String>,
    pub manufacturer_id: Option<String>,
    pub product_weight: Option<i64>,
    pub product_width: Option<i64>,
    pub product_height: Option<i64>,
    pub product_length: Option<i64>,
}

/// Component record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Component {
    pub id: String,
    pub template_id: String,
    pub name: String,
    pub manufacturer_id: Option<String>,
    pub weight: Option<i64>,
    pub time_created: i64,
    pub time_updated: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewComponent {
    pub name: String,
    pub manufacturer_id: Option<String>,
    pub weight: Option<i64>,
}

/// Partial component update; the parent template is not updatable
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentPatch {
    pub name: Option<String>,
    pub manufacturer_id: Option<String>,
    pub weight: Option<i64>,
}

fn non_negative(field: &str, value: Option<i64>) -> Result<()> {
    match value {
        Some(v) if v < 0 => Err(Error::invalid(format!("{} must not be negative", field))),
        _ => Ok(()),
    }
}

fn validate_dimensions(
    weight: Option<i64>,
    width: Option<i64>,
    height: Option<i64>,
    length: Option<i64>,
) -> Result<()> {
    non_negative("product_weight", weight)?;
    non_negative("product_width", width)?;
    non_negative("product_height", height)?;
    non_negative("product_length", length)
}

pub async fn create_asset_template(
    pool: &SqlitePool,
    ctx: WriteContext<'_>,
    new: &NewAssetTemplate,
) -> Result<AssetTemplate> {
    require_text("name", &new.name)?;
    require_text("manufacturer_id", &new.manufacturer_id)?;
    validate_dimensions(
        new.product_weight,
        new.product_width,
        new.product_height,
        new.product_length,
    )?;

    let template = AssetTemplate {
        id: ctx.ids.next_id(),
        name: new.name.trim().to_string(),
        manufacturer_id: new.manufacturer_id.trim().to_string(),
        product_weight: new.product_weight,
        product_width: new.product_width,
        product_height: new.product_height,
        product_length: new.product_length,
        time_created: ctx.now,
        time_updated: ctx.now,
    };

    sqlx::query(
        r#"
        INSERT INTO assettemplates (
            id, name, manufacturer_id, product_weight, product_width,
            product_height, product_length, time_created, time_updated
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&template.id)
    .bind(&template.name)
    .bind(&template.manufacturer_id)
    .bind(template.product_weight)
    .bind(template.product_width)
    .bind(template.product_height)
    .bind(template.product_length)
    .bind(template.time_created)
    .bind(template.time_updated)
    .execute(pool)
    .await?;

    Ok(template)
}

pub async fn get_asset_template(pool: &SqlitePool, template_id: &str) -> Result<AssetTemplate> {
    sqlx::query_as::<_, AssetTemplate>(
        r#"
        SELECT id, name, manufacturer_id, product_weight, product_width,
               product_height, product_length, time_created, time_updated
        FROM assettemplates WHERE id = ?
        "#,
    )
    .bind(template_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::not_found("AssetTemplate", template_id))
}

/// Apply a partial update in one statement
pub async fn update_asset_template(
    pool: &SqlitePool,
    ctx: WriteContext<'_>,
    template_id: &str,
    patch: &AssetTemplatePatch,
) -> Result<AssetTemplate> {
    if let Some(name) = &patch.name {
        require_text("name", name)?;
    }
    if let Some(manufacturer_id) = &patch.manufacturer_id {
        require_text("manufacturer_id", manufacturer_id)?;
    }
    validate_dimensions(
        patch.product_weight,
        patch.product_width,
        patch.product_height,
        patch.product_length,
    )?;

    let result = sqlx::query(
        r#"
        UPDATE assettemplates SET
            name = COALESCE(?, name),
            manufacturer_id = COALESCE(?, manufacturer_id),
            product_weight = COALESCE(?, product_weight),
            product_width = COALESCE(?, product_width),
            product_height = COALESCE(?, product_height),
            product_length = COALESCE(?, product_length),
            time_updated = ?
        WHERE id = ?
        "#,
    )
    .bind(patch.name.as_deref().map(str::trim))
    .bind(patch.manufacturer_id.as_deref().map(str::trim))
    .bind(patch.product_weight)
    .bind(patch.product_width)
    .bind(patch.product_height)
    .bind(patch.product_length)
    .bind(ctx.now)
    .bind(template_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("AssetTemplate", template_id));
    }

    get_asset_template(pool, template_id).await
}

pub async fn template_component_ids(pool: &SqlitePool, template_id: &str) -> Result<Vec<String>> {
    id_list(
        pool,
        "SELECT id FROM components WHERE template_id = ? ORDER BY id",
        template_id,
    )
    .await
}

pub async fn list_template_components(pool: &SqlitePool, template_id: &str) -> Result<Vec<Component>> {
    let components = sqlx::query_as::<_, Component>(
        r#"
        SELECT id, template_id, name, manufacturer_id, weight, time_created, time_updated
        FROM components WHERE template_id = ? ORDER BY id
        "#,
    )
    .bind(template_id)
    .fetch_all(pool)
    .await?;

    Ok(components)
}

pub async fn create_component(
    pool: &SqlitePool,
    ctx: WriteContext<'_>,
    template_id: &str,
    new: &NewComponent,
) -> Result<Component> {
    require_text("name", &new.name)?;
    non_negative("weight", new.weight)?;

    if !row_exists(pool, "assettemplates", template_id).await? {
        return Err(Error::not_found("AssetTemplate", template_id));
    }

    let component = Component {
        id: ctx.ids.next_id(),
        template_id: template_id.to_string(),
        name: new.name.trim().to_string(),
        manufacturer_id: new.manufacturer_id.clone(),
        weight: new.weight,
        time_created: ctx.now,
        time_updated: ctx.now,
    };

    sqlx::query(
        r#"
        INSERT INTO components (id, template_id, name, manufacturer_id, weight, time_created, time_updated)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&component.id)
    .bind(&component.template_id)
    .bind(&component.name)
    .bind(&component.manufacturer_id)
    .bind(component.weight)
    .bind(component.time_created)
    .bind(component.time_updated)
    .execute(pool)
    .await?;

    Ok(component)
}

pub async fn get_component(pool: &SqlitePool, component_id: &str) -> Result<Component> {
    sqlx::query_as::<_, Component>(
        r#"
        SELECT id, template_id, name, manufacturer_id, weight, time_created, time_updated
        FROM components WHERE id = ?
        "#,
    )
    .bind(component_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::not_found("Component", component_id))
}

pub async fn update_component(
    pool: &SqlitePool,
    ctx: WriteContext<'_>,
    component_id: &str,
    patch: &ComponentPatch,
) -> Result<Component> {
    if let Some(name) = &patch.name {
        require_text("name", name)?;
    }
    non_negative("weight", patch.weight)?;

    let result = sqlx::query(
        r#"
        UPDATE components SET
            name = COALESCE(?, name),
            manufacturer_id = COALESCE(?, manufacturer_id),
            weight = COALESCE(?, weight),
            time_updated = ?
        WHERE id = ?
        "#,
    )
    .bind(patch.name.as_deref().map(str::trim))
    .bind(&patch.manufacturer_id)
    .bind(patch.weight)
    .bind(ctx.now)
    .bind(component_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("Component", component_id));
    }

    get_component(pool, component_id).await
}

/// Delete a component definition
///
/// Parts instantiated from it stay in place with a dangling component id.
pub async fn delete_component(pool: &SqlitePool, component_id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM components WHERE id = ?")
        .bind(component_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("Component", component_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_memory_database;
    use crate::ids::SequentialIds;

    fn quad() -> NewAssetTemplate {
        NewAssetTemplate {
            name: "Quad X4".to_string(),
            manufacturer_id: "ACME-X4".to_string(),
            product_weight: Some(1_200),
            product_width: Some(450),
            product_height: Some(120),
            product_length: Some(450),
        }
    }

    #[tokio::test]
    async fn test_partial_template_update_keeps_other_fields() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("t-");
        let template = create_asset_template(&pool, WriteContext::new(&ids, 10), &quad())
            .await
            .unwrap();

        let updated = update_asset_template(
            &pool,
            WriteContext::new(&ids, 20),
            &template.id,
            &AssetTemplatePatch {
                name: Some("Quad X4 Mk2".to_string()),
                product_weight: Some(1_150),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "Quad X4 Mk2");
        assert_eq!(updated.product_weight, Some(1_150));
        assert_eq!(updated.manufacturer_id, "ACME-X4");
        assert_eq!(updated.product_width, Some(450));
        assert_eq!(updated.product_length, Some(450));
        assert_eq!(updated.time_created, 10);
        assert_eq!(updated.time_updated, 20);
    }

    #[tokio::test]
    async fn test_template_validation() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("t-");
        let ctx = WriteContext::new(&ids, 10);

        let mut negative = quad();
        negative.product_height = Some(-1);
        assert!(matches!(
            create_asset_template(&pool, ctx, &negative).await,
            Err(Error::InvalidInput(_))
        ));

        let missing = update_asset_template(&pool, ctx, "nope", &AssetTemplatePatch::default()).await;
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_component_lifecycle() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("c-");
        let ctx = WriteContext::new(&ids, 10);
        let template = create_asset_template(&pool, ctx, &quad()).await.unwrap();

        let rotor = create_component(
            &pool,
            ctx,
            &template.id,
            &NewComponent {
                name: "Front-left rotor blades".to_string(),
                manufacturer_id: Some("RB-10".to_string()),
                weight: Some(12),
            },
        )
        .await
        .unwrap();
        assert_eq!(rotor.template_id, template.id);
        assert_eq!(template_component_ids(&pool, &template.id).await.unwrap(), vec![rotor.id.clone()]);

        let updated = update_component(
            &pool,
            ctx,
            &rotor.id,
            &ComponentPatch {
                weight: Some(11),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.weight, Some(11));
        assert_eq!(updated.name, "Front-left rotor blades");
        assert_eq!(updated.template_id, template.id);

        delete_component(&pool, &rotor.id).await.unwrap();
        assert!(matches!(delete_component(&pool, &rotor.id).await, Err(Error::NotFound(_))));
        assert!(template_component_ids(&pool, &template.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_component_requires_existing_template() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("c-");
        let result = create_component(
            &pool,
            WriteContext::new(&ids, 10),
            "nope",
            &NewComponent {
                name: "Battery".to_string(),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_component_patch_rejects_template_change() {
        let parsed = serde_json::from_str::<ComponentPatch>(r#"{"template_id": "other"}"#);
        assert!(parsed.is_err());
    }
}
