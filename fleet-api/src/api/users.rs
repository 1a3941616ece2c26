//! User administration endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use fleet_common::access::{require, Capability, Role};
use fleet_common::api::{EntityResponse, MessageResponse};
use fleet_common::db::users::{self, User};
use serde::Deserialize;

use super::ApiJson;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub role: String,
}

/// POST /api/v1/user (owner only)
pub async fn create_user(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<EntityResponse<User>>)> {
    require(caller.role, Capability::ManageUsers)?;
    let role: Role = req.role.parse()?;

    let user = users::create_user(&state.db, state.write_ctx(), &req.email, role).await?;
    Ok((StatusCode::CREATED, Json(EntityResponse::new(user))))
}

/// GET /api/v1/user/:user_id (self or owner)
pub async fn get_user(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<EntityResponse<User>>> {
    if caller.id != user_id {
        require(caller.role, Capability::ManageUsers)?;
    }

    let user = users::get_user(&state.db, &user_id).await?;
    Ok(Json(EntityResponse::new(user)))
}

/// PUT /api/v1/user/:user_id (owner only)
pub async fn update_user(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(user_id): Path<String>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> ApiResult<Json<MessageResponse>> {
    require(caller.role, Capability::ManageUsers)?;
    let role: Role = req.role.parse()?;

    users::update_user_role(&state.db, state.write_ctx(), &user_id, role).await?;
    Ok(Json(MessageResponse::new("User updated successfully")))
}
