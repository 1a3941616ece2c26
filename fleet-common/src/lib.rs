//! # Fleet Common Library
//!
//! Shared code for the drone fleet maintenance service:
//! - Domain records and their SQLite persistence
//! - Maintenance compliance derivation (overdue parts)
//! - Session challenge and role-based access decisions
//! - API response shapes
//! - Configuration loading
//! - Id and clock capabilities injected into every write

pub mod access;
pub mod api;
pub mod compliance;
pub mod config;
pub mod db;
pub mod error;
pub mod ids;
pub mod time;

pub use error::{Error, Result};
