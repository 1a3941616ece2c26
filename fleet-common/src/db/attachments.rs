//! File attachment metadata
//!
//! An attachment points at an externally stored blob (uri, name, mime type)
//! and belongs to exactly one owner, identified by an [`AttachmentKind`] tag
//! plus the owner's id. Owner existence is not checked; the tag is.

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::fmt;
use std::str::FromStr;

use super::{require_text, WriteContext};
use crate::{Error, Result};

/// Entity kinds that can own attachments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttachmentKind {
    Asset,
    AssetPart,
    Inspection,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Asset => "Asset",
            AttachmentKind::AssetPart => "AssetPart",
            AttachmentKind::Inspection => "Inspection",
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttachmentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Asset" => Ok(AttachmentKind::Asset),
            "AssetPart" => Ok(AttachmentKind::AssetPart),
            "Inspection" => Ok(AttachmentKind::Inspection),
            other => Err(Error::invalid(format!(
                "unknown entity_type '{}': expected Asset, AssetPart or Inspection",
                other
            ))),
        }
    }
}

/// The single owner of an attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentOwner {
    #[serde(rename = "entity_type")]
    pub kind: AttachmentKind,
    #[serde(rename = "entity_id")]
    pub id: String,
}

impl AttachmentOwner {
    pub fn new(kind: AttachmentKind, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }

    /// Build from an untrusted type tag
    pub fn parse(kind: &str, id: &str) -> Result<Self> {
        require_text("entity_id", id)?;
        Ok(Self::new(kind.parse()?, id))
    }
}

/// Attachment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    #[serde(flatten)]
    pub owner: AttachmentOwner,
    pub uri: String,
    pub name: String,
    pub mime_type: String,
    pub time_created: i64,
}

impl Attachment {
    fn from_row(row: &SqliteRow) -> Result<Self> {
        let kind: String = row.try_get("entity_type")?;
        Ok(Self {
            id: row.try_get("id")?,
            owner: AttachmentOwner {
                kind: kind.parse().map_err(|_| {
                    Error::Internal(format!("stored entity_type '{}' is not valid", kind))
                })?,
                id: row.try_get("entity_id")?,
            },
            uri: row.try_get("uri")?,
            name: row.try_get("name")?,
            mime_type: row.try_get("mime_type")?,
            time_created: row.try_get("time_created")?,
        })
    }
}

/// Request to attach a file; `entity_type` is validated on use
#[derive(Debug, Clone, Deserialize)]
pub struct NewAttachment {
    pub entity_type: String,
    pub entity_id: String,
    pub uri: String,
    pub name: String,
    pub mime_type: String,
}

fn validate_mime_type(mime_type: &str) -> Result<()> {
    match mime_type.split_once('/') {
        Some((top, sub)) if !top.is_empty() && !sub.is_empty() => Ok(()),
        _ => Err(Error::invalid(format!("'{}' is not a mime type", mime_type))),
    }
}

pub async fn add_attachment(
    pool: &SqlitePool,
    ctx: WriteContext<'_>,
    new: &NewAttachment,
) -> Result<Attachment> {
    let owner = AttachmentOwner::parse(&new.entity_type, &new.entity_id)?;
    require_text("uri", &new.uri)?;
    require_text("name", &new.name)?;
    validate_mime_type(&new.mime_type)?;

    let attachment = Attachment {
        id: ctx.ids.next_id(),
        owner,
        uri: new.uri.trim().to_string(),
        name: new.name.trim().to_string(),
        mime_type: new.mime_type.trim().to_string(),
        time_created: ctx.now,
    };

    sqlx::query(
        r#"
        INSERT INTO attachments (id, entity_type, entity_id, uri, name, mime_type, time_created)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&attachment.id)
    .bind(attachment.owner.kind.as_str())
    .bind(&attachment.owner.id)
    .bind(&attachment.uri)
    .bind(&attachment.name)
    .bind(&attachment.mime_type)
    .bind(attachment.time_created)
    .execute(pool)
    .await?;

    Ok(attachment)
}

pub async fn remove_attachment(pool: &SqlitePool, attachment_id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM attachments WHERE id = ?")
        .bind(attachment_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("Attachment", attachment_id));
    }
    Ok(())
}

pub async fn list_attachments(pool: &SqlitePool, owner: &AttachmentOwner) -> Result<Vec<Attachment>> {
    let rows = sqlx::query(
        r#"
        SELECT id, entity_type, entity_id, uri, name, mime_type, time_created
        FROM attachments
        WHERE entity_type = ? AND entity_id = ?
        ORDER BY id
        "#,
    )
    .bind(owner.kind.as_str())
    .bind(&owner.id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(Attachment::from_row).collect()
}

/// URIs only, as embedded in asset reads
pub async fn attachment_uris(pool: &SqlitePool, owner: &AttachmentOwner) -> Result<Vec<String>> {
    let uris: Vec<String> = sqlx::query_scalar(
        "SELECT uri FROM attachments WHERE entity_type = ? AND entity_id = ? ORDER BY id",
    )
    .bind(owner.kind.as_str())
    .bind(&owner.id)
    .fetch_all(pool)
    .await?;

    Ok(uris)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_memory_database;
    use crate::ids::SequentialIds;

    fn photo(entity_type: &str, entity_id: &str, uri: &str) -> NewAttachment {
        NewAttachment {
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            uri: uri.to_string(),
            name: "photo.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
        }
    }

    #[test]
    fn test_kind_tags() {
        for kind in [AttachmentKind::Asset, AttachmentKind::AssetPart, AttachmentKind::Inspection] {
            assert_eq!(kind.as_str().parse::<AttachmentKind>().unwrap(), kind);
        }
        assert!("Fleet".parse::<AttachmentKind>().is_err());
        assert!("asset".parse::<AttachmentKind>().is_err());
    }

    #[test]
    fn test_attachment_serializes_owner_flat() {
        let attachment = Attachment {
            id: "a1".to_string(),
            owner: AttachmentOwner::new(AttachmentKind::AssetPart, "p1"),
            uri: "s3://bucket/p1.jpg".to_string(),
            name: "p1.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            time_created: 5,
        };
        let json = serde_json::to_value(&attachment).unwrap();
        assert_eq!(json["entity_type"], "AssetPart");
        assert_eq!(json["entity_id"], "p1");
        assert_eq!(json["uri"], "s3://bucket/p1.jpg");
    }

    #[tokio::test]
    async fn test_add_list_remove() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("att-");
        let ctx = WriteContext::new(&ids, 7);

        // Owner need not exist yet
        let first = add_attachment(&pool, ctx, &photo("Asset", "asset-1", "s3://b/1.jpg"))
            .await
            .unwrap();
        add_attachment(&pool, ctx, &photo("Asset", "asset-1", "s3://b/2.jpg"))
            .await
            .unwrap();
        add_attachment(&pool, ctx, &photo("Inspection", "asset-1", "s3://b/3.jpg"))
            .await
            .unwrap();

        let owner = AttachmentOwner::new(AttachmentKind::Asset, "asset-1");
        let uris = attachment_uris(&pool, &owner).await.unwrap();
        assert_eq!(uris, vec!["s3://b/1.jpg", "s3://b/2.jpg"]);

        remove_attachment(&pool, &first.id).await.unwrap();
        let remaining = list_attachments(&pool, &owner).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].uri, "s3://b/2.jpg");

        assert!(matches!(remove_attachment(&pool, &first.id).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_attachments_are_rejected() {
        let pool = init_memory_database().await.unwrap();
        let ids = SequentialIds::new("att-");
        let ctx = WriteContext::new(&ids, 7);

        let unknown_tag = add_attachment(&pool, ctx, &photo("Fleet", "f1", "s3://b/1.jpg")).await;
        assert!(matches!(unknown_tag, Err(Error::InvalidInput(_))));

        let mut bad_mime = photo("Asset", "a1", "s3://b/1.jpg");
        bad_mime.mime_type = "jpeg".to_string();
        assert!(matches!(add_attachment(&pool, ctx, &bad_mime).await, Err(Error::InvalidInput(_))));

        let no_uri = add_attachment(&pool, ctx, &photo("Asset", "a1", "")).await;
        assert!(matches!(no_uri, Err(Error::InvalidInput(_))));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attachments")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
