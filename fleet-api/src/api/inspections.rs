//! Inspection endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use fleet_common::access::{require, Capability};
use fleet_common::api::EntityResponse;
use fleet_common::db::inspections::{
    self, Inspection, InspectionEvent, InspectionOutcome, InspectionPatch,
};
use fleet_common::db::users::User;
use serde::Deserialize;

use super::ApiJson;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub timestamp: i64,
}

/// POST /api/v1/asset/:asset_id/inspection
pub async fn schedule_inspection(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(asset_id): Path<String>,
    ApiJson(req): ApiJson<ScheduleRequest>,
) -> ApiResult<(StatusCode, Json<EntityResponse<Inspection>>)> {
    require(caller.role, Capability::Report)?;

    let inspection =
        inspections::schedule_inspection(&state.db, state.write_ctx(), &asset_id, req.timestamp)
            .await?;
    Ok((StatusCode::CREATED, Json(EntityResponse::new(inspection))))
}

/// POST /api/v1/asset-part/:part_id/inspection
pub async fn log_inspection(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(part_id): Path<String>,
    ApiJson(event): ApiJson<InspectionEvent>,
) -> ApiResult<(StatusCode, Json<EntityResponse<Inspection>>)> {
    require(caller.role, Capability::Report)?;

    let inspection =
        inspections::log_inspection(&state.db, state.write_ctx(), &part_id, &event).await?;
    Ok((StatusCode::CREATED, Json(EntityResponse::new(inspection))))
}

/// GET /api/v1/asset-part/:part_id/inspection
pub async fn list_part_inspections(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(part_id): Path<String>,
) -> ApiResult<Json<Vec<EntityResponse<Inspection>>>> {
    require(caller.role, Capability::Read)?;

    let history = inspections::list_part_inspections(&state.db, &part_id).await?;
    Ok(Json(history.into_iter().map(EntityResponse::new).collect()))
}

/// POST /api/v1/inspection/batch
///
/// Always 200 once the body is a JSON array; per-entry failures are
/// reported in the outcome list.
pub async fn log_batch(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    ApiJson(entries): ApiJson<Vec<serde_json::Value>>,
) -> ApiResult<Json<Vec<InspectionOutcome>>> {
    require(caller.role, Capability::Report)?;

    let outcomes = inspections::log_inspection_batch(&state.db, state.write_ctx(), entries).await;
    Ok(Json(outcomes))
}

/// GET /api/v1/inspection/:inspection_id
pub async fn get_inspection(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(inspection_id): Path<String>,
) -> ApiResult<Json<EntityResponse<Inspection>>> {
    require(caller.role, Capability::Read)?;

    let inspection = inspections::get_inspection(&state.db, &inspection_id).await?;
    Ok(Json(EntityResponse::new(inspection)))
}

/// PATCH /api/v1/inspection/:inspection_id
///
/// Only condition and notes can be corrected.
pub async fn update_inspection(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(inspection_id): Path<String>,
    ApiJson(patch): ApiJson<InspectionPatch>,
) -> ApiResult<Json<EntityResponse<Inspection>>> {
    require(caller.role, Capability::Report)?;

    let inspection =
        inspections::update_inspection(&state.db, state.write_ctx(), &inspection_id, &patch)
            .await?;
    Ok(Json(EntityResponse::new(inspection)))
}
