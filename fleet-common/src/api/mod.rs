//! Response shapes shared by every HTTP surface
//!
//! Plain serde types, no framework dependencies. The transport crate wraps
//! them in its own response machinery.

pub mod types;

pub use types::{
    EntityResponse, ErrorResponse, MessageResponse, Relationships, Resource, SessionRequest,
};
