//! Fleet endpoints, including compliance

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use fleet_common::access::{require, Capability};
use fleet_common::api::{EntityResponse, MessageResponse};
use fleet_common::compliance::{compute_overdue_parts, FleetCompliance};
use fleet_common::db::fleets::{self, Fleet, NewFleet};
use fleet_common::db::users::User;

use super::ApiJson;
use crate::error::ApiResult;
use crate::AppState;

/// POST /api/v1/fleet
pub async fn create_fleet(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    ApiJson(new): ApiJson<NewFleet>,
) -> ApiResult<(StatusCode, Json<EntityResponse<Fleet>>)> {
    require(caller.role, Capability::Edit)?;

    let fleet = fleets::create_fleet(&state.db, state.write_ctx(), &new).await?;
    Ok((
        StatusCode::CREATED,
        Json(
            EntityResponse::new(fleet)
                .with_templates(Vec::new())
                .with_assets(Vec::new()),
        ),
    ))
}

/// GET /api/v1/fleet/:fleet_id
pub async fn get_fleet(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(fleet_id): Path<String>,
) -> ApiResult<Json<EntityResponse<Fleet>>> {
    require(caller.role, Capability::Read)?;

    let fleet = fleets::get_fleet(&state.db, &fleet_id).await?;
    let templates = fleets::fleet_template_ids(&state.db, &fleet_id).await?;
    let assets = fleets::fleet_asset_ids(&state.db, &fleet_id).await?;

    Ok(Json(
        EntityResponse::new(fleet)
            .with_templates(templates)
            .with_assets(assets),
    ))
}

/// GET /api/v1/fleet/:fleet_id/compliance
pub async fn get_compliance(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(fleet_id): Path<String>,
) -> ApiResult<Json<FleetCompliance>> {
    require(caller.role, Capability::Read)?;

    let report = compute_overdue_parts(&state.db, &fleet_id, state.now()).await?;
    Ok(Json(report))
}

/// POST /api/v1/fleet/:fleet_id/template/:template_id
pub async fn associate_template(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path((fleet_id, template_id)): Path<(String, String)>,
) -> ApiResult<Json<MessageResponse>> {
    require(caller.role, Capability::Edit)?;

    fleets::associate_template(&state.db, &fleet_id, &template_id).await?;
    Ok(Json(MessageResponse::new("Template added to fleet")))
}

/// DELETE /api/v1/fleet/:fleet_id/template/:template_id
pub async fn dissociate_template(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path((fleet_id, template_id)): Path<(String, String)>,
) -> ApiResult<Json<MessageResponse>> {
    require(caller.role, Capability::Edit)?;

    fleets::dissociate_template(&state.db, &fleet_id, &template_id).await?;
    Ok(Json(MessageResponse::new("Template removed from fleet")))
}

/// POST /api/v1/fleet/:fleet_id/asset/:asset_id
pub async fn assign_asset(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path((fleet_id, asset_id)): Path<(String, String)>,
) -> ApiResult<Json<MessageResponse>> {
    require(caller.role, Capability::Edit)?;

    fleets::assign_asset_to_fleet(&state.db, state.write_ctx(), &fleet_id, &asset_id).await?;
    Ok(Json(MessageResponse::new("Asset added to fleet")))
}

/// DELETE /api/v1/fleet/:fleet_id/asset/:asset_id
pub async fn unassign_asset(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path((fleet_id, asset_id)): Path<(String, String)>,
) -> ApiResult<Json<MessageResponse>> {
    require(caller.role, Capability::Edit)?;

    fleets::unassign_asset_from_fleet(&state.db, state.write_ctx(), &fleet_id, &asset_id).await?;
    Ok(Json(MessageResponse::new("Asset removed from fleet")))
}
