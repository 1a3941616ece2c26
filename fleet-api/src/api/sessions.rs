//! Login challenge and session endpoints (public)

use axum::{
    extract::{Path, State},
    Json,
};
use fleet_common::api::{MessageResponse, SessionRequest};
use fleet_common::db::sessions::{self, Session};
use serde::Deserialize;
use tracing::info;

use super::{ApiJson, ApiQuery};
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(default)]
    pub token: String,
}

/// POST /api/v1/auth/session
///
/// Issues a login challenge; the link goes out through the challenge sender.
pub async fn create_session(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SessionRequest>,
) -> ApiResult<Json<MessageResponse>> {
    sessions::create_session(
        &state.db,
        state.write_ctx(),
        state.sender.as_ref(),
        &req.email,
        state.challenge_ttl_secs,
    )
    .await?;

    Ok(Json(MessageResponse::new("Magic link sent to email")))
}

/// GET /api/v1/auth/session/verify?token=
pub async fn verify_session(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<VerifyQuery>,
) -> ApiResult<Json<Session>> {
    let session = sessions::verify_session(&state.db, state.write_ctx(), &query.token).await?;
    Ok(Json(session))
}

/// DELETE /api/v1/auth/session/:session_id
///
/// Logout. Idempotent; knowing the session id is the credential.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    sessions::delete_session(&state.db, &session_id).await?;
    info!("Logout processed");
    Ok(Json(MessageResponse::new("Session deleted")))
}
