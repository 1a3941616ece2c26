//! Asset and asset part endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use fleet_common::access::{require, Capability};
use fleet_common::api::{EntityResponse, MessageResponse};
use fleet_common::db::assets::{
    self, Asset, AssetDetail, AssetPart, AssetPartPatch, NewAsset, NewAssetPart,
};
use fleet_common::db::users::User;

use super::ApiJson;
use crate::error::ApiResult;
use crate::AppState;

/// POST /api/v1/asset
pub async fn create_asset(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    ApiJson(new): ApiJson<NewAsset>,
) -> ApiResult<(StatusCode, Json<EntityResponse<Asset>>)> {
    require(caller.role, Capability::Edit)?;

    let asset = assets::create_asset(&state.db, state.write_ctx(), &new).await?;
    Ok((StatusCode::CREATED, Json(EntityResponse::new(asset))))
}

/// GET /api/v1/asset/:asset_id
///
/// The asset with its parts and the attachment URIs of both.
pub async fn get_asset(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(asset_id): Path<String>,
) -> ApiResult<Json<EntityResponse<AssetDetail>>> {
    require(caller.role, Capability::Read)?;

    let detail = assets::get_asset_detail(&state.db, &asset_id).await?;
    Ok(Json(EntityResponse::new(detail)))
}

/// GET /api/v1/asset/:asset_id/part
pub async fn list_parts(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(asset_id): Path<String>,
) -> ApiResult<Json<Vec<EntityResponse<AssetPart>>>> {
    require(caller.role, Capability::Read)?;

    // 404 rather than an empty list for an unknown asset
    assets::get_asset(&state.db, &asset_id).await?;

    let parts = assets::list_asset_parts(&state.db, &asset_id).await?;
    Ok(Json(parts.into_iter().map(EntityResponse::new).collect()))
}

/// POST /api/v1/asset/:asset_id/part
pub async fn create_part(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(asset_id): Path<String>,
    ApiJson(new): ApiJson<NewAssetPart>,
) -> ApiResult<(StatusCode, Json<EntityResponse<AssetPart>>)> {
    require(caller.role, Capability::Edit)?;

    let part = assets::create_asset_part(&state.db, state.write_ctx(), &asset_id, &new).await?;
    Ok((StatusCode::CREATED, Json(EntityResponse::new(part))))
}

/// POST /api/v1/asset/:asset_id/populate
///
/// One part per template component not yet installed.
pub async fn populate_parts(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(asset_id): Path<String>,
) -> ApiResult<(StatusCode, Json<Vec<EntityResponse<AssetPart>>>)> {
    require(caller.role, Capability::Edit)?;

    let created = assets::populate_asset_parts(&state.db, state.write_ctx(), &asset_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(created.into_iter().map(EntityResponse::new).collect()),
    ))
}

/// GET /api/v1/asset-part/:part_id
pub async fn get_part(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(part_id): Path<String>,
) -> ApiResult<Json<EntityResponse<AssetPart>>> {
    require(caller.role, Capability::Read)?;

    let part = assets::get_asset_part(&state.db, &part_id).await?;
    Ok(Json(EntityResponse::new(part)))
}

/// PATCH /api/v1/asset-part/:part_id
pub async fn update_part(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(part_id): Path<String>,
    ApiJson(patch): ApiJson<AssetPartPatch>,
) -> ApiResult<Json<EntityResponse<AssetPart>>> {
    require(caller.role, Capability::Edit)?;

    let part = assets::update_asset_part(&state.db, state.write_ctx(), &part_id, &patch).await?;
    Ok(Json(EntityResponse::new(part)))
}

/// DELETE /api/v1/asset-part/:part_id
pub async fn delete_part(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(part_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    require(caller.role, Capability::Edit)?;

    assets::delete_asset_part(&state.db, &part_id).await?;
    Ok(Json(MessageResponse::new("Asset part deleted")))
}
