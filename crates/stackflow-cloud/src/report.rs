//! Engine reports
//!
//! After the external engine has processed a deployment document it answers
//! with an [`EngineReport`]: the live state of every resource it touched and
//! the failures it hit. Failures are surfaced verbatim; stackflow never
//! retries or compensates.

use crate::error::{CloudError, Result};
use crate::urn::Urn;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Outcome reported by the engine for a whole deployment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineReport {
    /// Live state indexed by URN
    #[serde(default)]
    pub resources: HashMap<Urn, ResourceState>,

    /// Failures as reported by the engine
    #[serde(default)]
    pub failures: Vec<ResourceFailure>,

    /// Total execution time in milliseconds
    #[serde(default)]
    pub duration_ms: u64,
}

impl EngineReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn add_resource(&mut self, urn: Urn, state: ResourceState) {
        self.resources.insert(urn, state);
    }

    pub fn add_failure(&mut self, urn: Option<Urn>, message: impl Into<String>) {
        self.failures.push(ResourceFailure {
            urn,
            message: message.into(),
        });
    }

    /// Fail with every reported message joined, if there were any
    pub fn ensure_success(&self) -> Result<()> {
        if self.is_success() {
            return Ok(());
        }
        let messages: Vec<String> = self.failures.iter().map(|f| f.to_string()).collect();
        Err(CloudError::EngineFailed(messages.join("; ")))
    }

    /// Look up a dotted property path in a resource's outputs
    pub fn lookup(&self, urn: &Urn, path: &str) -> Option<&Value> {
        self.resources.get(urn).and_then(|state| state.output(path))
    }
}

/// A single failure reported by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceFailure {
    #[serde(default)]
    pub urn: Option<Urn>,
    pub message: String,
}

impl std::fmt::Display for ResourceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.urn {
            Some(urn) => write!(f, "{}: {}", urn.name(), self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Live state of a single resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceState {
    /// Provider-specific resource ID
    #[serde(default)]
    pub id: Option<String>,

    /// Resource type token
    pub resource_type: String,

    /// Current status
    #[serde(default)]
    pub status: ResourceStatus,

    /// Computed properties (endpoints, keys, generated names)
    #[serde(default)]
    pub outputs: Map<String, Value>,

    /// Last update timestamp
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ResourceState {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            id: None,
            resource_type: resource_type.into(),
            status: ResourceStatus::Unknown,
            outputs: Map::new(),
            updated_at: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_output(mut self, key: impl Into<String>, value: Value) -> Self {
        self.outputs.insert(key.into(), value);
        self
    }

    /// Walk a dotted path (`primaryEndpoints.web`) through the outputs
    pub fn output(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let root = self.outputs.get(first)?;
        segments.try_fold(root, |current, segment| match current {
            Value::Object(fields) => fields.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }
}

/// Status of a resource as reported by the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Created,
    Updated,
    Unchanged,
    Pending,
    Failed,
    #[default]
    Unknown,
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceStatus::Created => write!(f, "created"),
            ResourceStatus::Updated => write!(f, "updated"),
            ResourceStatus::Unchanged => write!(f, "unchanged"),
            ResourceStatus::Pending => write!(f, "pending"),
            ResourceStatus::Failed => write!(f, "failed"),
            ResourceStatus::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn storage_urn() -> Urn {
        Urn::new("dev", "webstack", "azure-native:storage:StorageAccount", "site")
    }

    #[test]
    fn test_lookup_nested_output() {
        let mut report = EngineReport::new();
        report.add_resource(
            storage_urn(),
            ResourceState::new("azure-native:storage:StorageAccount")
                .with_status(ResourceStatus::Created)
                .with_output(
                    "primaryEndpoints",
                    json!({ "web": "https://site.z13.web.core.windows.net/" }),
                ),
        );

        assert_eq!(
            report.lookup(&storage_urn(), "primaryEndpoints.web"),
            Some(&json!("https://site.z13.web.core.windows.net/"))
        );
        assert_eq!(report.lookup(&storage_urn(), "primaryEndpoints.blob"), None);
        assert_eq!(report.lookup(&Urn::from("urn:missing"), "name"), None);
    }

    #[test]
    fn test_ensure_success_surfaces_failures() {
        let mut report = EngineReport::new();
        assert!(report.ensure_success().is_ok());

        report.add_failure(Some(storage_urn()), "SkuNotAvailable");
        report.add_failure(None, "quota exceeded");

        let err = report.ensure_success().unwrap_err().to_string();
        assert!(err.contains("site: SkuNotAvailable"));
        assert!(err.contains("quota exceeded"));
    }

    #[test]
    fn test_parse_engine_json() {
        let raw = r#"{
            "resources": {
                "urn:stackflow:dev::webstack::azure-native:insights:Component::ai": {
                    "id": "/subscriptions/x/ai",
                    "resourceType": "azure-native:insights:Component",
                    "status": "created",
                    "outputs": { "instrumentationKey": "0000-1111" }
                }
            },
            "durationMs": 4200
        }"#;

        let report: EngineReport = serde_json::from_str(raw).unwrap();
        assert!(report.is_success());
        assert_eq!(report.duration_ms, 4200);
        let urn = Urn::from("urn:stackflow:dev::webstack::azure-native:insights:Component::ai");
        assert_eq!(report.resources[&urn].status, ResourceStatus::Created);
        assert_eq!(
            report.lookup(&urn, "instrumentationKey"),
            Some(&json!("0000-1111"))
        );
    }
}
