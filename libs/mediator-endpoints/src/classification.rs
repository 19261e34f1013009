//! Request classifications and the HTTP methods each one maps to.

use std::fmt;

use http::Method;
use serde::{Deserialize, Serialize};

/// Semantic intent of a request, mapped to a fixed set of HTTP methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestClassification {
    Query,
    Command,
    CreateCommand,
    UpdateReplaceCommand,
    UpdateModifyCommand,
    DeleteCommand,
}

impl RequestClassification {
    pub const ALL: [Self; 6] = [
        Self::Query,
        Self::Command,
        Self::CreateCommand,
        Self::UpdateReplaceCommand,
        Self::UpdateModifyCommand,
        Self::DeleteCommand,
    ];

    /// Never empty.
    #[must_use]
    pub fn http_methods(self) -> Vec<Method> {
        vec![match self {
            Self::Query => Method::GET,
            Self::Command | Self::CreateCommand => Method::POST,
            Self::UpdateReplaceCommand => Method::PUT,
            Self::UpdateModifyCommand => Method::PATCH,
            Self::DeleteCommand => Method::DELETE,
        }]
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Command => "command",
            Self::CreateCommand => "create_command",
            Self::UpdateReplaceCommand => "update_replace_command",
            Self::UpdateModifyCommand => "update_modify_command",
            Self::DeleteCommand => "delete_command",
        }
    }
}

impl fmt::Display for RequestClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
