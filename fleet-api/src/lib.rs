//! fleet-api library - HTTP surface of the drone fleet maintenance service
//!
//! Public routes: health and the session challenge flow.
//! Everything else requires `Authorization: Bearer <session id>`.

use axum::Router;
use fleet_common::db::sessions::ChallengeSender;
use fleet_common::db::WriteContext;
use fleet_common::ids::IdSource;
use fleet_common::time::Clock;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    pub ids: Arc<dyn IdSource>,
    pub clock: Arc<dyn Clock>,
    /// Delivers login challenges to users
    pub sender: Arc<dyn ChallengeSender>,
    /// Lifetime of a login challenge, seconds
    pub challenge_ttl_secs: i64,
}

impl AppState {
    /// Create new application state
    pub fn new(
        db: SqlitePool,
        ids: Arc<dyn IdSource>,
        clock: Arc<dyn Clock>,
        sender: Arc<dyn ChallengeSender>,
        challenge_ttl_secs: i64,
    ) -> Self {
        Self {
            db,
            ids,
            clock,
            sender,
            challenge_ttl_secs,
        }
    }

    /// Current time, Unix seconds
    pub fn now(&self) -> i64 {
        self.clock.unix_now()
    }

    /// Id source and timestamp for one write
    pub fn write_ctx(&self) -> WriteContext<'_> {
        WriteContext::new(self.ids.as_ref(), self.now())
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, post};

    // Protected routes (require a live session)
    let protected = Router::new()
        // Users
        .route("/api/v1/user", post(api::users::create_user))
        .route(
            "/api/v1/user/:user_id",
            get(api::users::get_user).put(api::users::update_user),
        )
        // Ports
        .route("/api/v1/port", post(api::ports::create_port))
        .route("/api/v1/port/:port_id", get(api::ports::get_port))
        .route(
            "/api/v1/port/:port_id/fleet/:fleet_id",
            post(api::ports::assign_fleet).delete(api::ports::unassign_fleet),
        )
        // Fleets
        .route("/api/v1/fleet", post(api::fleets::create_fleet))
        .route("/api/v1/fleet/:fleet_id", get(api::fleets::get_fleet))
        .route(
            "/api/v1/fleet/:fleet_id/compliance",
            get(api::fleets::get_compliance),
        )
        .route(
            "/api/v1/fleet/:fleet_id/template/:template_id",
            post(api::fleets::associate_template).delete(api::fleets::dissociate_template),
        )
        .route(
            "/api/v1/fleet/:fleet_id/asset/:asset_id",
            post(api::fleets::assign_asset).delete(api::fleets::unassign_asset),
        )
        // Equipment catalog
        .route("/api/v1/asset-template", post(api::templates::create_template))
        .route(
            "/api/v1/asset-template/:template_id",
            get(api::templates::get_template).patch(api::templates::update_template),
        )
        .route(
            "/api/v1/asset-template/:template_id/component",
            post(api::templates::create_component),
        )
        .route(
            "/api/v1/component/:component_id",
            get(api::templates::get_component)
                .patch(api::templates::update_component)
                .delete(api::templates::delete_component),
        )
        // Assets and parts
        .route("/api/v1/asset", post(api::assets::create_asset))
        .route("/api/v1/asset/:asset_id", get(api::assets::get_asset))
        .route(
            "/api/v1/asset/:asset_id/part",
            get(api::assets::list_parts).post(api::assets::create_part),
        )
        .route(
            "/api/v1/asset/:asset_id/populate",
            post(api::assets::populate_parts),
        )
        .route(
            "/api/v1/asset/:asset_id/inspection",
            post(api::inspections::schedule_inspection),
        )
        .route(
            "/api/v1/asset-part/:part_id",
            get(api::assets::get_part)
                .patch(api::assets::update_part)
                .delete(api::assets::delete_part),
        )
        .route(
            "/api/v1/asset-part/:part_id/inspection",
            get(api::inspections::list_part_inspections).post(api::inspections::log_inspection),
        )
        // Inspections
        .route("/api/v1/inspection/batch", post(api::inspections::log_batch))
        .route(
            "/api/v1/inspection/:inspection_id",
            get(api::inspections::get_inspection).patch(api::inspections::update_inspection),
        )
        // Attachments
        .route(
            "/api/v1/attachment",
            get(api::attachments::list_attachments).post(api::attachments::add_attachment),
        )
        .route(
            "/api/v1/attachment/:attachment_id",
            delete(api::attachments::remove_attachment),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/api/v1/auth/session", post(api::sessions::create_session))
        .route("/api/v1/auth/session/verify", get(api::sessions::verify_session))
        .route(
            "/api/v1/auth/session/:session_id",
            delete(api::sessions::delete_session),
        )
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
