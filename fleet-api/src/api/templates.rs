//! Equipment catalog endpoints: asset templates and components

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use fleet_common::access::{require, Capability};
use fleet_common::api::{EntityResponse, MessageResponse};
use fleet_common::db::catalog::{
    self, AssetTemplate, AssetTemplatePatch, Component, ComponentPatch, NewAssetTemplate,
    NewComponent,
};
use fleet_common::db::users::User;

use super::ApiJson;
use crate::error::ApiResult;
use crate::AppState;

/// POST /api/v1/asset-template
pub async fn create_template(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    ApiJson(new): ApiJson<NewAssetTemplate>,
) -> ApiResult<(StatusCode, Json<EntityResponse<AssetTemplate>>)> {
    require(caller.role, Capability::Edit)?;

    let template = catalog::create_asset_template(&state.db, state.write_ctx(), &new).await?;
    Ok((
        StatusCode::CREATED,
        Json(EntityResponse::new(template).with_components(Vec::new())),
    ))
}

/// GET /api/v1/asset-template/:template_id
pub async fn get_template(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(template_id): Path<String>,
) -> ApiResult<Json<EntityResponse<AssetTemplate>>> {
    require(caller.role, Capability::Read)?;

    let template = catalog::get_asset_template(&state.db, &template_id).await?;
    let components = catalog::template_component_ids(&state.db, &template_id).await?;

    Ok(Json(EntityResponse::new(template).with_components(components)))
}

/// PATCH /api/v1/asset-template/:template_id
pub async fn update_template(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(template_id): Path<String>,
    ApiJson(patch): ApiJson<AssetTemplatePatch>,
) -> ApiResult<Json<EntityResponse<AssetTemplate>>> {
    require(caller.role, Capability::Edit)?;

    let template =
        catalog::update_asset_template(&state.db, state.write_ctx(), &template_id, &patch).await?;
    Ok(Json(EntityResponse::new(template)))
}

/// POST /api/v1/asset-template/:template_id/component
pub async fn create_component(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(template_id): Path<String>,
    ApiJson(new): ApiJson<NewComponent>,
) -> ApiResult<(StatusCode, Json<EntityResponse<Component>>)> {
    require(caller.role, Capability::Edit)?;

    let component =
        catalog::create_component(&state.db, state.write_ctx(), &template_id, &new).await?;
    Ok((StatusCode::CREATED, Json(EntityResponse::new(component))))
}

/// GET /api/v1/component/:component_id
pub async fn get_component(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(component_id): Path<String>,
) -> ApiResult<Json<EntityResponse<Component>>> {
    require(caller.role, Capability::Read)?;

    let component = catalog::get_component(&state.db, &component_id).await?;
    Ok(Json(EntityResponse::new(component)))
}

/// PATCH /api/v1/component/:component_id
pub async fn update_component(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(component_id): Path<String>,
    ApiJson(patch): ApiJson<ComponentPatch>,
) -> ApiResult<Json<EntityResponse<Component>>> {
    require(caller.role, Capability::Edit)?;

    let component =
        catalog::update_component(&state.db, state.write_ctx(), &component_id, &patch).await?;
    Ok(Json(EntityResponse::new(component)))
}

/// DELETE /api/v1/component/:component_id
pub async fn delete_component(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(component_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    require(caller.role, Capability::Edit)?;

    catalog::delete_component(&state.db, &component_id).await?;
    Ok(Json(MessageResponse::new("Component deleted")))
}
