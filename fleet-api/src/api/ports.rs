//! Port endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use fleet_common::access::{require, Capability};
use fleet_common::api::{EntityResponse, MessageResponse};
use fleet_common::db::fleets;
use fleet_common::db::ports::{self, NewPort, Port};
use fleet_common::db::users::User;

use super::ApiJson;
use crate::error::ApiResult;
use crate::AppState;

/// POST /api/v1/port
pub async fn create_port(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    ApiJson(new): ApiJson<NewPort>,
) -> ApiResult<(StatusCode, Json<EntityResponse<Port>>)> {
    require(caller.role, Capability::Edit)?;

    let port = ports::create_port(&state.db, state.write_ctx(), &new).await?;
    Ok((StatusCode::CREATED, Json(EntityResponse::new(port))))
}

/// GET /api/v1/port/:port_id
///
/// Includes the ids of the fleets based there.
pub async fn get_port(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(port_id): Path<String>,
) -> ApiResult<Json<EntityResponse<Port>>> {
    require(caller.role, Capability::Read)?;

    let port = ports::get_port(&state.db, &port_id).await?;
    let fleet_ids = ports::port_fleet_ids(&state.db, &port_id).await?;

    Ok(Json(EntityResponse::new(port).with_fleets(fleet_ids)))
}

/// POST /api/v1/port/:port_id/fleet/:fleet_id
pub async fn assign_fleet(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path((port_id, fleet_id)): Path<(String, String)>,
) -> ApiResult<Json<MessageResponse>> {
    require(caller.role, Capability::Edit)?;

    fleets::assign_fleet_to_port(&state.db, state.write_ctx(), &fleet_id, &port_id).await?;
    Ok(Json(MessageResponse::new("Fleet added to port")))
}

/// DELETE /api/v1/port/:port_id/fleet/:fleet_id
///
/// Compare-and-clear: a fleet no longer at this port is left alone and the
/// call still succeeds.
pub async fn unassign_fleet(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path((port_id, fleet_id)): Path<(String, String)>,
) -> ApiResult<Json<MessageResponse>> {
    require(caller.role, Capability::Edit)?;

    fleets::unassign_fleet_from_port(&state.db, state.write_ctx(), &fleet_id, &port_id).await?;
    Ok(Json(MessageResponse::new("Fleet removed from port")))
}
