//! Worker nodes registered in the coordination service.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a registered node.
///
/// The role is taken from the directory segment a node's key lives under,
/// e.g. `<prefix>/ffmpeg/<name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Media transcoding worker
    Converter,
    /// Peer API instance
    Api,
}

impl Role {
    /// All roles, in cursor order.
    pub const ALL: [Role; 2] = [Role::Converter, Role::Api];

    /// Map a directory segment to a role. Unknown segments yield `None`.
    pub fn from_directory(segment: &str) -> Option<Self> {
        match segment {
            "ffmpeg" => Some(Role::Converter),
            "http_api" => Some(Role::Api),
            _ => None,
        }
    }

    /// Directory segment this role is registered under.
    pub fn directory(&self) -> &'static str {
        match self {
            Role::Converter => "ffmpeg",
            Role::Api => "http_api",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Converter => "converter",
            Role::Api => "api",
        }
    }

    /// Stable slot index, used for per-role counters.
    pub fn index(&self) -> usize {
        match self {
            Role::Converter => 0,
            Role::Api => 1,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered worker node. Identity is `(role, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    /// Address as stored in the coordination service (usually `host:port`)
    pub address: String,
    /// Leaf name of the registration key
    pub name: String,
    pub role: Role,
}

impl Node {
    pub fn new(role: Role, name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
            role,
        }
    }

    /// Identity key of this node.
    pub fn identity(&self) -> (Role, &str) {
        (self.role, &self.name)
    }
}
