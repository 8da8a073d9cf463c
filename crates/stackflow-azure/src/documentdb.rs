//! `azure-native:documentdb` (Cosmos DB)

use crate::AzureResource;
use crate::error::{AzureError, Result};
use crate::resources::ResourceGroup;
use stackflow_cloud::{Output, PropertyMap, PropertyValue, ResourceHandle, Stack};
use std::fmt;

/// Offer type of a database account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DatabaseAccountOfferType {
    #[default]
    Standard,
}

impl fmt::Display for DatabaseAccountOfferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseAccountOfferType::Standard => write!(f, "Standard"),
        }
    }
}

/// Default consistency level of a database account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DefaultConsistencyLevel {
    Eventual,
    #[default]
    Session,
    BoundedStaleness,
    Strong,
    ConsistentPrefix,
}

impl fmt::Display for DefaultConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DefaultConsistencyLevel::Eventual => "Eventual",
            DefaultConsistencyLevel::Session => "Session",
            DefaultConsistencyLevel::BoundedStaleness => "BoundedStaleness",
            DefaultConsistencyLevel::Strong => "Strong",
            DefaultConsistencyLevel::ConsistentPrefix => "ConsistentPrefix",
        };
        f.write_str(s)
    }
}

/// A region the account is replicated to
#[derive(Debug, Clone)]
pub struct Location {
    pub location_name: Output<String>,
    pub failover_priority: i64,
}

impl From<&Location> for PropertyValue {
    fn from(location: &Location) -> Self {
        PropertyMap::new()
            .with("locationName", &location.location_name)
            .with("failoverPriority", location.failover_priority)
            .into()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsistencyPolicy {
    pub default_consistency_level: DefaultConsistencyLevel,
}

/// Arguments for [`DatabaseAccount`]
#[derive(Debug, Clone)]
pub struct DatabaseAccountArgs<'a> {
    pub resource_group: &'a ResourceGroup,
    pub offer_type: DatabaseAccountOfferType,
    pub locations: Vec<Location>,
    pub consistency_policy: ConsistencyPolicy,
}

/// Cosmos DB account
#[derive(Debug, Clone)]
pub struct DatabaseAccount {
    handle: ResourceHandle,
    pub name: Output<String>,
    pub id: Output<String>,
    /// `https://<account>.documents.azure.com:443/`
    pub document_endpoint: Output<String>,
}

impl DatabaseAccount {
    pub const TYPE: &'static str = "azure-native:documentdb:DatabaseAccount";

    pub fn new(stack: &mut Stack, name: &str, args: DatabaseAccountArgs<'_>) -> Result<Self> {
        if args.locations.is_empty() {
            return Err(AzureError::InvalidArgument {
                resource: Self::TYPE.to_string(),
                message: "at least one location is required".to_string(),
            });
        }

        let inputs = PropertyMap::new()
            .with("resourceGroupName", &args.resource_group.name)
            .with("databaseAccountOfferType", args.offer_type.to_string())
            .with(
                "locations",
                args.locations
                    .iter()
                    .map(PropertyValue::from)
                    .collect::<Vec<_>>(),
            )
            .with(
                "consistencyPolicy",
                PropertyMap::new().with(
                    "defaultConsistencyLevel",
                    args.consistency_policy.default_consistency_level.to_string(),
                ),
            );
        let handle = stack.register(Self::TYPE, name, inputs)?;

        Ok(Self {
            name: stack.output(&handle, "name"),
            id: stack.output(&handle, "id"),
            document_endpoint: stack.output(&handle, "documentEndpoint"),
            handle,
        })
    }
}

impl AzureResource for DatabaseAccount {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

/// Arguments for [`SqlResourceSqlDatabase`]
#[derive(Debug, Clone)]
pub struct SqlResourceSqlDatabaseArgs<'a> {
    pub resource_group: &'a ResourceGroup,
    pub account: &'a DatabaseAccount,
    /// Database id inside the account
    pub database_id: String,
}

/// SQL API database inside a Cosmos DB account
#[derive(Debug, Clone)]
pub struct SqlResourceSqlDatabase {
    handle: ResourceHandle,
    pub name: Output<String>,
    pub id: Output<String>,
}

impl SqlResourceSqlDatabase {
    pub const TYPE: &'static str = "azure-native:documentdb:SqlResourceSqlDatabase";

    pub fn new(
        stack: &mut Stack,
        name: &str,
        args: SqlResourceSqlDatabaseArgs<'_>,
    ) -> Result<Self> {

        let inputs = PropertyMap::new()
            .with("resourceGroupName", &args.resource_group.name)
            .with("accountName", &args.account.name)
            .with("resource", PropertyMap::new().with("id", args.database_id));
        let handle = stack.register(Self::TYPE, name, inputs)?;

        Ok(Self {
            name: stack.output(&handle, "name"),
            id: stack.output(&handle, "id"),
            handle,
        })
    }
}

impl AzureResource for SqlResourceSqlDatabase {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}
