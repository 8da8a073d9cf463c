//! Deployment document: the handoff format consumed by the engine

use crate::error::{CloudError, Result};
use crate::urn::Urn;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

pub const DOCUMENT_VERSION: u32 = 1;

/// Serialised resource graph
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentDocument {
    pub version: u32,
    pub project: String,
    pub stack: String,
    pub generated_at: DateTime<Utc>,
    pub resources: Vec<ResourceEntry>,
    #[serde(default)]
    pub outputs: BTreeMap<String, Value>,
}

/// One resource in the document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEntry {
    pub urn: Urn,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    pub inputs: BTreeMap<String, Value>,
    #[serde(default)]
    pub depends_on: Vec<Urn>,
}

/// Output encoding for the document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocumentFormat {
    #[default]
    Json,
    Yaml,
}

impl FromStr for DocumentFormat {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(DocumentFormat::Json),
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            other => Err(CloudError::InvalidConfig(format!(
                "unknown document format: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentFormat::Json => write!(f, "json"),
            DocumentFormat::Yaml => write!(f, "yaml"),
        }
    }
}

impl DeploymentDocument {
    pub fn render(&self, format: DocumentFormat) -> Result<String> {
        match format {
            DocumentFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            DocumentFormat::Yaml => Ok(serde_yaml::to_string(self)?),
        }
    }

    pub fn parse(content: &str, format: DocumentFormat) -> Result<Self> {
        let doc: Self = match format {
            DocumentFormat::Json => serde_json::from_str(content)?,
            DocumentFormat::Yaml => serde_yaml::from_str(content)?,
        };

        if doc.version > DOCUMENT_VERSION {
            return Err(CloudError::StateError(format!(
                "Document version {} is newer than supported version {}",
                doc.version, DOCUMENT_VERSION
            )));
        }
        Ok(doc)
    }

    /// Count of resources per type
    pub fn summary(&self) -> DocumentSummary {
        let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
        for resource in &self.resources {
            *by_type.entry(resource.resource_type.clone()).or_default() += 1;
        }
        DocumentSummary {
            by_type,
            resources: self.resources.len(),
            outputs: self.outputs.len(),
        }
    }
}

/// Summary of a deployment document
#[derive(Debug, Clone)]
pub struct DocumentSummary {
    pub by_type: BTreeMap<String, usize>,
    pub resources: usize,
    pub outputs: usize,
}

impl std::fmt::Display for DocumentSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} resources across {} types, {} outputs",
            self.resources,
            self.by_type.len(),
            self.outputs
        )
    }
}
