//! Resource graph construction
//!
//! A [`Stack`] collects resource declarations in a single synchronous pass.
//! It does not order, diff or provision anything: dependencies are derived
//! from the references found in each resource's inputs and handed to the
//! engine as part of the deployment document.

use crate::document::{DOCUMENT_VERSION, DeploymentDocument, ResourceEntry};
use crate::error::{CloudError, Result};
use crate::output::{Output, PropertyMap, PropertyRef, PropertyValue};
use crate::report::EngineReport;
use crate::urn::Urn;
use chrono::Utc;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

/// Handle to a declared resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    urn: Urn,
    resource_type: String,
    name: String,
}

impl ResourceHandle {
    pub fn urn(&self) -> &Urn {
        &self.urn
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Logical name given at declaration
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A resource as recorded in the graph
#[derive(Debug, Clone)]
pub struct ResourceDeclaration {
    pub urn: Urn,
    pub resource_type: String,
    pub name: String,
    pub inputs: BTreeMap<String, PropertyValue>,
    pub depends_on: Vec<Urn>,
}

impl ResourceDeclaration {
    /// Input at a dotted path, e.g. `siteConfig.connectionStrings`
    pub fn input(&self, path: &str) -> Option<&PropertyValue> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let value = self.inputs.get(head)?;
        match rest {
            Some(rest) => value.pointer(rest),
            None => Some(value),
        }
    }
}

/// Declarative graph for one stack of one project
#[derive(Debug)]
pub struct Stack {
    project: String,
    name: String,
    resources: Vec<ResourceDeclaration>,
    index: HashMap<Urn, usize>,
    cells: BTreeMap<(Urn, String), Arc<OnceLock<Value>>>,
    exports: BTreeMap<String, PropertyValue>,
}

impl Stack {
    pub fn new(project: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            name: name.into(),
            resources: Vec::new(),
            index: HashMap::new(),
            cells: BTreeMap::new(),
            exports: BTreeMap::new(),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record a resource declaration
    ///
    /// Fails if the same type and name were already declared, or if an input
    /// references a resource that is not part of this stack.
    pub fn register(
        &mut self,
        resource_type: &str,
        name: &str,
        inputs: PropertyMap,
    ) -> Result<ResourceHandle> {
        let urn = Urn::new(&self.name, &self.project, resource_type, name);
        if self.index.contains_key(&urn) {
            return Err(CloudError::ResourceAlreadyExists(urn.to_string()));
        }

        let inputs = inputs.into_inner();
        let mut depends_on: Vec<Urn> = Vec::new();
        for reference in inputs.values().flat_map(PropertyValue::references) {
            let target = reference.urn();
            if !self.index.contains_key(target) {
                return Err(CloudError::ResourceNotFound(format!(
                    "{} (referenced by {} '{}')",
                    target, resource_type, name
                )));
            }
            if !depends_on.contains(target) {
                depends_on.push(target.clone());
            }
        }

        debug!(
            urn = %urn,
            dependencies = depends_on.len(),
            "Registered resource"
        );

        self.index.insert(urn.clone(), self.resources.len());
        self.resources.push(ResourceDeclaration {
            urn: urn.clone(),
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            inputs,
            depends_on,
        });

        Ok(ResourceHandle {
            urn,
            resource_type: resource_type.to_string(),
            name: name.to_string(),
        })
    }

    /// Deferred handle for a computed property of a declared resource
    ///
    /// Asking for the same property twice yields the same underlying cell.
    pub fn output<T>(&mut self, resource: &ResourceHandle, property: &str) -> Output<T> {
        let cell = self
            .cells
            .entry((resource.urn.clone(), property.to_string()))
            .or_default()
            .clone();
        Output::from_value(PropertyValue::Ref(PropertyRef::new(
            resource.urn.clone(),
            property,
            cell,
        )))
    }

    /// Record a program output
    pub fn export<T>(&mut self, name: impl Into<String>, output: &Output<T>) {
        let name = name.into();
        debug!(export = %name, "Registered stack export");
        self.exports.insert(name, output.as_value().clone());
    }

    pub fn exports(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.exports.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn export_value(&self, name: &str) -> Option<&PropertyValue> {
        self.exports.get(name)
    }

    pub fn resources(&self) -> &[ResourceDeclaration] {
        &self.resources
    }

    pub fn get(&self, urn: &Urn) -> Option<&ResourceDeclaration> {
        self.index.get(urn).map(|&i| &self.resources[i])
    }

    pub fn by_type(&self, resource_type: &str) -> Vec<&ResourceDeclaration> {
        self.resources
            .iter()
            .filter(|r| r.resource_type == resource_type)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Fill every requested property cell from an engine report
    ///
    /// Returns the number of cells that received a value. `id` falls back to
    /// the provider ID when the engine did not list it among the outputs.
    pub fn resolve(&self, report: &EngineReport) -> usize {
        let mut resolved = 0;
        for ((urn, property), cell) in &self.cells {
            if cell.get().is_some() {
                continue;
            }
            let value = report.lookup(urn, property).cloned().or_else(|| {
                (property == "id")
                    .then(|| report.resources.get(urn))
                    .flatten()
                    .and_then(|state| state.id.clone())
                    .map(Value::String)
            });
            if let Some(value) = value
                && cell.set(value).is_ok()
            {
                resolved += 1;
            }
        }
        info!(
            resolved,
            requested = self.cells.len(),
            "Resolved outputs from engine report"
        );
        resolved
    }

    /// Serialise the graph for the engine
    pub fn to_document(&self) -> DeploymentDocument {
        DeploymentDocument {
            version: DOCUMENT_VERSION,
            project: self.project.clone(),
            stack: self.name.clone(),
            generated_at: Utc::now(),
            resources: self
                .resources
                .iter()
                .map(|r| ResourceEntry {
                    urn: r.urn.clone(),
                    resource_type: r.resource_type.clone(),
                    name: r.name.clone(),
                    inputs: r
                        .inputs
                        .iter()
                        .map(|(k, v)| (k.clone(), v.to_wire()))
                        .collect(),
                    depends_on: r.depends_on.clone(),
                })
                .collect(),
            outputs: self
                .exports
                .iter()
                .map(|(k, v)| (k.clone(), v.to_wire()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ResourceState;
    use serde_json::json;

    fn stack_with_group() -> (Stack, ResourceHandle) {
        let mut stack = Stack::new("webstack", "dev");
        let group = stack
            .register(
                "test:Group",
                "rg",
                PropertyMap::new().with("location", "EastUS"),
            )
            .unwrap();
        (stack, group)
    }

    #[test]
    fn test_duplicate_declaration_rejected() {
        let (mut stack, _) = stack_with_group();
        let result = stack.register("test:Group", "rg", PropertyMap::new());
        assert!(matches!(result, Err(CloudError::ResourceAlreadyExists(_))));

        // Same name, different type is fine
        assert!(stack.register("test:Other", "rg", PropertyMap::new()).is_ok());
    }

    #[test]
    fn test_dependencies_follow_references() {
        let (mut stack, group) = stack_with_group();
        let group_name: Output<String> = stack.output(&group, "name");

        let child = stack
            .register(
                "test:Child",
                "child",
                PropertyMap::new()
                    .with("groupName", &group_name)
                    .with("nested", PropertyMap::new().with("again", &group_name)),
            )
            .unwrap();

        let declared = stack.get(child.urn()).unwrap();
        assert_eq!(declared.depends_on, vec![group.urn().clone()]);
        assert!(declared.input("nested.again").unwrap().as_reference().is_some());
    }

    #[test]
    fn test_reference_to_foreign_resource_rejected() {
        let (mut stack, _) = stack_with_group();
        let mut other = Stack::new("webstack", "prod");
        let foreign = other
            .register("test:Group", "rg", PropertyMap::new())
            .unwrap();
        let foreign_name: Output<String> = other.output(&foreign, "name");

        let result = stack.register(
            "test:Child",
            "child",
            PropertyMap::new().with("groupName", &foreign_name),
        );
        assert!(matches!(result, Err(CloudError::ResourceNotFound(_))));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_same_property_shares_cell() {
        let (mut stack, group) = stack_with_group();
        let a: Output<String> = stack.output(&group, "name");
        let b: Output<String> = stack.output(&group, "name");

        let mut report = EngineReport::new();
        report.add_resource(
            group.urn().clone(),
            ResourceState::new("test:Group").with_output("name", json!("rg-live")),
        );

        assert_eq!(stack.resolve(&report), 1);
        assert_eq!(a.get().as_deref(), Some("rg-live"));
        assert_eq!(b.get().as_deref(), Some("rg-live"));
    }

    #[test]
    fn test_resolve_id_falls_back_to_provider_id() {
        let (mut stack, group) = stack_with_group();
        let id: Output<String> = stack.output(&group, "id");

        let mut report = EngineReport::new();
        report.add_resource(
            group.urn().clone(),
            ResourceState::new("test:Group").with_id("/subscriptions/s/resourceGroups/rg"),
        );
        stack.resolve(&report);

        assert_eq!(id.get().as_deref(), Some("/subscriptions/s/resourceGroups/rg"));
    }

    #[test]
    fn test_resolve_is_write_once() {
        let (mut stack, group) = stack_with_group();
        let name: Output<String> = stack.output(&group, "name");

        let mut first = EngineReport::new();
        first.add_resource(
            group.urn().clone(),
            ResourceState::new("test:Group").with_output("name", json!("one")),
        );
        let mut second = EngineReport::new();
        second.add_resource(
            group.urn().clone(),
            ResourceState::new("test:Group").with_output("name", json!("two")),
        );

        assert_eq!(stack.resolve(&first), 1);
        assert_eq!(stack.resolve(&second), 0);
        assert_eq!(name.get().as_deref(), Some("one"));
    }

    #[test]
    fn test_document_contains_resources_and_exports() {
        let (mut stack, group) = stack_with_group();
        let name: Output<String> = stack.output(&group, "name");
        stack.export("groupName", &name);

        let doc = stack.to_document();
        assert_eq!(doc.version, DOCUMENT_VERSION);
        assert_eq!(doc.stack, "dev");
        assert_eq!(doc.resources.len(), 1);
        assert_eq!(doc.resources[0].inputs["location"], json!("EastUS"));
        assert_eq!(
            doc.outputs["groupName"]["$ref"]["urn"],
            json!(group.urn().as_str())
        );
    }
}
