//! Attachment metadata endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use fleet_common::access::{require, Capability};
use fleet_common::api::{EntityResponse, MessageResponse};
use fleet_common::db::attachments::{self, Attachment, AttachmentOwner, NewAttachment};
use fleet_common::db::users::User;
use serde::Deserialize;

use super::{ApiJson, ApiQuery};
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub entity_type: String,
    pub entity_id: String,
}

/// POST /api/v1/attachment
pub async fn add_attachment(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    ApiJson(new): ApiJson<NewAttachment>,
) -> ApiResult<(StatusCode, Json<EntityResponse<Attachment>>)> {
    require(caller.role, Capability::Report)?;

    let attachment = attachments::add_attachment(&state.db, state.write_ctx(), &new).await?;
    Ok((StatusCode::CREATED, Json(EntityResponse::new(attachment))))
}

/// GET /api/v1/attachment?entity_type=&entity_id=
pub async fn list_attachments(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
) -> ApiResult<Json<Vec<EntityResponse<Attachment>>>> {
    require(caller.role, Capability::Read)?;

    let owner = AttachmentOwner::parse(&query.entity_type, &query.entity_id)?;

    let records = attachments::list_attachments(&state.db, &owner).await?;
    Ok(Json(records.into_iter().map(EntityResponse::new).collect()))
}

/// DELETE /api/v1/attachment/:attachment_id
pub async fn remove_attachment(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(attachment_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    require(caller.role, Capability::Report)?;

    attachments::remove_attachment(&state.db, &attachment_id).await?;
    Ok(Json(MessageResponse::new("Attachment removed")))
}
