//! Resource identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a declared resource within a stack
///
/// Format: `urn:stackflow:<stack>::<project>::<type>::<name>`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Urn(String);

impl Urn {
    pub fn new(stack: &str, project: &str, resource_type: &str, name: &str) -> Self {
        Self(format!(
            "urn:stackflow:{}::{}::{}::{}",
            stack, project, resource_type, name
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Logical name (last segment)
    pub fn name(&self) -> &str {
        self.0.rsplit("::").next().unwrap_or(&self.0)
    }

    /// Type token, e.g. `azure-native:storage:Blob`
    pub fn resource_type(&self) -> Option<&str> {
        let mut parts = self.0.rsplitn(3, "::");
        parts.next()?;
        parts.next()
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Urn {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
