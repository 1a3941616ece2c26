//! Role labels and the per-operation capability table

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// The four persisted role labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    Reporter,
    Editor,
    Owner,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Viewer, Role::Reporter, Role::Editor, Role::Owner];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Reporter => "reporter",
            Role::Editor => "editor",
            Role::Owner => "owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| {
                Error::invalid("Invalid role. Must be viewer, reporter, editor, or owner")
            })
    }
}

/// What an operation needs from the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Any read, including compliance
    Read,
    /// Inspection logging/correction and attachments
    Report,
    /// Structural edits: ports, fleets, catalog, assets, parts
    Edit,
    /// User administration
    ManageUsers,
}

impl Capability {
    fn label(&self) -> &'static str {
        match self {
            Capability::Read => "read",
            Capability::Report => "report",
            Capability::Edit => "edit",
            Capability::ManageUsers => "manage users",
        }
    }
}

/// Decision table: does `role` grant `capability`?
pub fn permits(role: Role, capability: Capability) -> bool {
    use Capability::*;
    use Role::*;

    match (capability, role) {
        (Read, _) => true,
        (Report, Reporter | Editor | Owner) => true,
        (Edit, Editor | Owner) => true,
        (ManageUsers, Owner) => true,
        _ => false,
    }
}

/// Fail with Forbidden unless `role` grants `capability`
pub fn require(role: Role, capability: Capability) -> Result<()> {
    if permits(role, capability) {
        Ok(())
    } else {
        Err(Error::Forbidden(format!(
            "role '{}' may not {}",
            role,
            capability.label()
        )))
    }
}
