//! `azure-native:storage`

use crate::AzureResource;
use crate::error::Result;
use crate::resources::ResourceGroup;
use stackflow_cloud::{FileAsset, Output, PropertyMap, ResourceHandle, Stack};

/// Arguments for [`StorageAccount`]
#[derive(Debug, Clone)]
pub struct StorageAccountArgs<'a> {
    pub resource_group: &'a ResourceGroup,
    /// e.g. `StorageV2`
    pub kind: String,
    /// SKU name, e.g. `Standard_LRS`
    pub sku_name: String,
}

/// Storage account
#[derive(Debug, Clone)]
pub struct StorageAccount {
    handle: ResourceHandle,
    pub name: Output<String>,
    pub id: Output<String>,
    pub primary_endpoints: PrimaryEndpoints,
}

/// Public endpoints of a storage account
#[derive(Debug, Clone)]
pub struct PrimaryEndpoints {
    pub blob: Output<String>,
    /// Static website endpoint, e.g. `https://<account>.z13.web.core.windows.net/`
    pub web: Output<String>,
}

impl StorageAccount {
    pub const TYPE: &'static str = "azure-native:storage:StorageAccount";

    pub fn new(stack: &mut Stack, name: &str, args: StorageAccountArgs<'_>) -> Result<Self> {

        let inputs = PropertyMap::new()
            .with("resourceGroupName", &args.resource_group.name)
            .with("kind", args.kind)
            .with("sku", PropertyMap::new().with("name", args.sku_name));
        let handle = stack.register(Self::TYPE, name, inputs)?;

        Ok(Self {
            name: stack.output(&handle, "name"),
            id: stack.output(&handle, "id"),
            primary_endpoints: PrimaryEndpoints {
                blob: stack.output(&handle, "primaryEndpoints.blob"),
                web: stack.output(&handle, "primaryEndpoints.web"),
            },
            handle,
        })
    }
}

impl AzureResource for StorageAccount {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

/// Arguments for [`StorageAccountStaticWebsite`]
#[derive(Debug, Clone)]
pub struct StorageAccountStaticWebsiteArgs<'a> {
    pub resource_group: &'a ResourceGroup,
    pub account: &'a StorageAccount,
    pub index_document: Option<String>,
    pub error404_document: Option<String>,
}

/// Static website hosting on a storage account
///
/// Enabling it makes the service create the `$web` container; its name is
/// exposed as [`container_name`](Self::container_name).
#[derive(Debug, Clone)]
pub struct StorageAccountStaticWebsite {
    handle: ResourceHandle,
    pub container_name: Output<String>,
    pub index_document: Output<String>,
    pub error404_document: Output<String>,
}

impl StorageAccountStaticWebsite {
    pub const TYPE: &'static str = "azure-native:storage:StorageAccountStaticWebsite";

    pub fn new(
        stack: &mut Stack,
        name: &str,
        args: StorageAccountStaticWebsiteArgs<'_>,
    ) -> Result<Self> {

        let inputs = PropertyMap::new()
            .with("accountName", &args.account.name)
            .with("resourceGroupName", &args.resource_group.name)
            .with_opt("indexDocument", args.index_document)
            .with_opt("error404Document", args.error404_document);
        let handle = stack.register(Self::TYPE, name, inputs)?;

        Ok(Self {
            container_name: stack.output(&handle, "containerName"),
            index_document: stack.output(&handle, "indexDocument"),
            error404_document: stack.output(&handle, "error404Document"),
            handle,
        })
    }
}

impl AzureResource for StorageAccountStaticWebsite {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

/// Arguments for [`Blob`]
#[derive(Debug, Clone)]
pub struct BlobArgs<'a> {
    pub resource_group: &'a ResourceGroup,
    pub account: &'a StorageAccount,
    pub container_name: Output<String>,
    pub source: FileAsset,
    pub content_type: Option<String>,
}

/// A blob uploaded from a local file
///
/// The blob name is the logical resource name.
#[derive(Debug, Clone)]
pub struct Blob {
    handle: ResourceHandle,
    pub name: Output<String>,
    pub url: Output<String>,
}

impl Blob {
    pub const TYPE: &'static str = "azure-native:storage:Blob";

    pub fn new(stack: &mut Stack, name: &str, args: BlobArgs<'_>) -> Result<Self> {

        let inputs = PropertyMap::new()
            .with("resourceGroupName", &args.resource_group.name)
            .with("accountName", &args.account.name)
            .with("containerName", &args.container_name)
            .with("blobName", name)
            .with("source", args.source)
            .with_opt("contentType", args.content_type);
        let handle = stack.register(Self::TYPE, name, inputs)?;

        Ok(Self {
            name: stack.output(&handle, "name"),
            url: stack.output(&handle, "url"),
            handle,
        })
    }
}

impl AzureResource for Blob {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}
