//! HTTP API handlers for fleet-api

pub mod assets;
pub mod attachments;
pub mod auth;
pub mod fleets;
pub mod health;
pub mod inspections;
pub mod ports;
pub mod sessions;
pub mod templates;
pub mod users;

pub use auth::{auth_middleware, ApiJson, ApiQuery};
pub use health::health_routes;
