//! Shared API request/response types

use serde::{Deserialize, Serialize};

use crate::db::assets::{Asset, AssetDetail, AssetPart};
use crate::db::attachments::Attachment;
use crate::db::catalog::{AssetTemplate, Component};
use crate::db::fleets::Fleet;
use crate::db::inspections::Inspection;
use crate::db::ports::Port;
use crate::db::sessions::Session;
use crate::db::users::User;

// ========================================
// Entity Responses
// ========================================

/// A record that can be returned as `{id, type, fields}`
pub trait Resource: Serialize {
    /// Value of the `type` member
    const TYPE: &'static str;

    fn resource_id(&self) -> &str;
}

macro_rules! resource {
    ($ty:ty, $name:literal) => {
        impl Resource for $ty {
            const TYPE: &'static str = $name;

            fn resource_id(&self) -> &str {
                &self.id
            }
        }
    };
}

resource!(Port, "Port");
resource!(Fleet, "Fleet");
resource!(AssetTemplate, "AssetTemplate");
resource!(Component, "Component");
resource!(Asset, "Asset");
resource!(AssetPart, "AssetPart");
resource!(Inspection, "Inspection");
resource!(Attachment, "Attachment");
resource!(User, "User");
resource!(Session, "Session");

impl Resource for AssetDetail {
    const TYPE: &'static str = "Asset";

    fn resource_id(&self) -> &str {
        &self.asset.id
    }
}

/// Child id lists attached to hierarchy reads
///
/// Only the lists that apply to the entity are serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Relationships {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fleet: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<String>>,
}

/// Single-entity response
///
/// # Examples
///
/// ```
/// use fleet_common::api::types::EntityResponse;
/// use fleet_common::db::catalog::AssetTemplate;
///
/// let template = AssetTemplate {
///     id: "t-1".to_string(),
///     name: "Quad X4".to_string(),
///     manufacturer_id: "ACME".to_string(),
///     product_weight: None,
///     product_width: None,
///     product_height: None,
///     product_length: None,
///     time_created: 0,
///     time_updated: 0,
/// };
/// let response = EntityResponse::new(template).with_components(vec!["c-1".to_string()]);
/// let json = serde_json::to_value(&response).unwrap();
/// assert_eq!(json["type"], "AssetTemplate");
/// assert_eq!(json["components"][0], "c-1");
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct EntityResponse<T: Serialize> {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub fields: T,
    #[serde(flatten)]
    pub relationships: Relationships,
}

impl<T: Resource> EntityResponse<T> {
    pub fn new(record: T) -> Self {
        Self {
            id: record.resource_id().to_string(),
            kind: T::TYPE,
            fields: record,
            relationships: Relationships::default(),
        }
    }

    pub fn with_templates(mut self, ids: Vec<String>) -> Self {
        self.relationships.templates = Some(ids);
        self
    }

    pub fn with_assets(mut self, ids: Vec<String>) -> Self {
        self.relationships.assets = Some(ids);
        self
    }

    pub fn with_fleets(mut self, ids: Vec<String>) -> Self {
        self.relationships.fleet = Some(ids);
        self
    }

    pub fn with_components(mut self, ids: Vec<String>) -> Self {
        self.relationships.components = Some(ids);
        self
    }
}

/// Acknowledgement of a pure action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ========================================
// Error Response Types
// ========================================

/// Body of every failed request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// ========================================
// Requests
// ========================================

/// Body of a login challenge request
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionRequest {
    pub email: String,
}
