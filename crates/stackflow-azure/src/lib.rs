//! stackflow Azure Native
//!
//! Typed declarations for the `azure-native` resource types used by
//! stackflow stacks. Each constructor validates its arguments, registers
//! the resource on a [`Stack`](stackflow_cloud::Stack) and returns a struct
//! whose public fields are deferred outputs.
//!
//! ```ignore
//! let rg = ResourceGroup::new(&mut stack, "rg", ResourceGroupArgs { .. })?;
//! let plan = AppServicePlan::new(&mut stack, "plan", AppServicePlanArgs {
//!     resource_group: &rg,
//!     ..
//! })?;
//! ```
//!
//! Every resource except the group takes `&ResourceGroup`, so a group that
//! was never declared cannot be referenced.

pub mod documentdb;
pub mod error;
pub mod insights;
pub mod resources;
pub mod storage;
pub mod web;

use stackflow_cloud::{ResourceHandle, Urn};

// Re-exports
pub use documentdb::{
    ConsistencyPolicy, DatabaseAccount, DatabaseAccountArgs, DatabaseAccountOfferType,
    DefaultConsistencyLevel, Location, SqlResourceSqlDatabase, SqlResourceSqlDatabaseArgs,
};
pub use error::{AzureError, Result};
pub use insights::{Component, ComponentArgs};
pub use resources::{ResourceGroup, ResourceGroupArgs};
pub use storage::{
    Blob, BlobArgs, PrimaryEndpoints, StorageAccount, StorageAccountArgs,
    StorageAccountStaticWebsite, StorageAccountStaticWebsiteArgs,
};
pub use web::{
    AppServicePlan, AppServicePlanArgs, ConnStringInfo, ConnectionStringType, NameValuePair,
    SiteConfig, SkuDescription, WebApp, WebAppArgs,
};

/// Common surface of every declared Azure resource
pub trait AzureResource {
    fn handle(&self) -> &ResourceHandle;

    fn urn(&self) -> &Urn {
        self.handle().urn()
    }

    fn resource_type(&self) -> &str {
        self.handle().resource_type()
    }
}
