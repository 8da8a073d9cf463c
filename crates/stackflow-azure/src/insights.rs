//! `azure-native:insights` (Application Insights)

use crate::AzureResource;
use crate::error::Result;
use crate::resources::ResourceGroup;
use stackflow_cloud::{Output, PropertyMap, ResourceHandle, Stack};

/// Arguments for [`Component`]
#[derive(Debug, Clone)]
pub struct ComponentArgs<'a> {
    pub resource_group: &'a ResourceGroup,
    /// e.g. `web`
    pub kind: String,
    /// e.g. `web`, `other`
    pub application_type: String,
}

/// Application Insights component
#[derive(Debug, Clone)]
pub struct Component {
    handle: ResourceHandle,
    pub name: Output<String>,
    pub id: Output<String>,
    pub instrumentation_key: Output<String>,
    pub connection_string: Output<String>,
}

impl Component {
    pub const TYPE: &'static str = "azure-native:insights:Component";

    pub fn new(stack: &mut Stack, name: &str, args: ComponentArgs<'_>) -> Result<Self> {

        let inputs = PropertyMap::new()
            .with("resourceGroupName", &args.resource_group.name)
            .with("kind", args.kind)
            .with("applicationType", args.application_type);
        let handle = stack.register(Self::TYPE, name, inputs)?;

        Ok(Self {
            name: stack.output(&handle, "name"),
            id: stack.output(&handle, "id"),
            instrumentation_key: stack.output(&handle, "instrumentationKey"),
            connection_string: stack.output(&handle, "connectionString"),
            handle,
        })
    }
}

impl AzureResource for Component {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ResourceGroupArgs;
    use serde_json::json;
    use stackflow_cloud::{EngineReport, ResourceState};

    #[test]
    fn test_instrumentation_key_resolves_from_report() {
        let mut stack = Stack::new("webstack", "dev");
        let rg = ResourceGroup::new(
            &mut stack,
            "rg",
            ResourceGroupArgs {
                resource_group_name: None,
                location: "EastUS".to_string(),
            },
        )
        .unwrap();
        let component = Component::new(
            &mut stack,
            "insights",
            ComponentArgs {
                resource_group: &rg,
                kind: "web".to_string(),
                application_type: "web".to_string(),
            },
        )
        .unwrap();
        assert_eq!(component.instrumentation_key.get(), None);

        let mut report = EngineReport::new();
        report.add_resource(
            component.urn().clone(),
            ResourceState::new(Component::TYPE).with_output("instrumentationKey", json!("abc-123")),
        );
        stack.resolve(&report);

        assert_eq!(component.instrumentation_key.get(), Some("abc-123".to_string()));
    }
}
