//! `azure-native:resources`

use crate::AzureResource;
use crate::error::Result;
use stackflow_cloud::{Output, PropertyMap, ResourceHandle, Stack};

/// Arguments for [`ResourceGroup`]
#[derive(Debug, Clone)]
pub struct ResourceGroupArgs {
    /// Explicit group name; the engine auto-names the group when unset
    pub resource_group_name: Option<String>,
    pub location: String,
}

/// Resource group: the container every other resource points at
#[derive(Debug, Clone)]
pub struct ResourceGroup {
    handle: ResourceHandle,
    pub name: Output<String>,
    pub location: Output<String>,
    pub id: Output<String>,
}

impl ResourceGroup {
    pub const TYPE: &'static str = "azure-native:resources:ResourceGroup";

    pub fn new(stack: &mut Stack, name: &str, args: ResourceGroupArgs) -> Result<Self> {

        let inputs = PropertyMap::new()
            .with("location", args.location)
            .with_opt("resourceGroupName", args.resource_group_name);
        let handle = stack.register(Self::TYPE, name, inputs)?;

        Ok(Self {
            name: stack.output(&handle, "name"),
            location: stack.output(&handle, "location"),
            id: stack.output(&handle, "id"),
            handle,
        })
    }
}

impl AzureResource for ResourceGroup {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}
