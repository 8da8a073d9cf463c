//! `azure-native:web` (App Service)

use crate::AzureResource;
use crate::error::Result;
use crate::resources::ResourceGroup;
use stackflow_cloud::{Output, PropertyMap, PropertyValue, ResourceHandle, Stack};
use std::fmt;

/// SKU of an App Service plan
#[derive(Debug, Clone)]
pub struct SkuDescription {
    /// e.g. `B1`
    pub name: String,
    /// e.g. `Basic`
    pub tier: String,
}

/// Arguments for [`AppServicePlan`]
#[derive(Debug, Clone)]
pub struct AppServicePlanArgs<'a> {
    pub resource_group: &'a ResourceGroup,
    /// e.g. `App`, `Linux`
    pub kind: String,
    pub sku: SkuDescription,
}

/// App Service plan (server farm)
#[derive(Debug, Clone)]
pub struct AppServicePlan {
    handle: ResourceHandle,
    pub name: Output<String>,
    pub id: Output<String>,
}

impl AppServicePlan {
    pub const TYPE: &'static str = "azure-native:web:AppServicePlan";

    pub fn new(stack: &mut Stack, name: &str, args: AppServicePlanArgs<'_>) -> Result<Self> {

        let inputs = PropertyMap::new()
            .with("resourceGroupName", &args.resource_group.name)
            .with("kind", args.kind)
            .with(
                "sku",
                PropertyMap::new()
                    .with("name", args.sku.name)
                    .with("tier", args.sku.tier),
            );
        let handle = stack.register(Self::TYPE, name, inputs)?;

        Ok(Self {
            name: stack.output(&handle, "name"),
            id: stack.output(&handle, "id"),
            handle,
        })
    }
}

impl AzureResource for AppServicePlan {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

/// Connection string kind as App Service understands it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStringType {
    MySql,
    SQLServer,
    SQLAzure,
    Custom,
    NotificationHub,
    ServiceBus,
    EventHub,
    ApiHub,
    DocDb,
    RedisCache,
    PostgreSQL,
}

impl fmt::Display for ConnectionStringType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionStringType::MySql => "MySql",
            ConnectionStringType::SQLServer => "SQLServer",
            ConnectionStringType::SQLAzure => "SQLAzure",
            ConnectionStringType::Custom => "Custom",
            ConnectionStringType::NotificationHub => "NotificationHub",
            ConnectionStringType::ServiceBus => "ServiceBus",
            ConnectionStringType::EventHub => "EventHub",
            ConnectionStringType::ApiHub => "ApiHub",
            ConnectionStringType::DocDb => "DocDb",
            ConnectionStringType::RedisCache => "RedisCache",
            ConnectionStringType::PostgreSQL => "PostgreSQL",
        };
        f.write_str(s)
    }
}

/// Application setting
#[derive(Debug, Clone)]
pub struct NameValuePair {
    pub name: String,
    pub value: Output<String>,
}

impl NameValuePair {
    pub fn new(name: impl Into<String>, value: impl Into<Output<String>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl From<&NameValuePair> for PropertyValue {
    fn from(pair: &NameValuePair) -> Self {
        PropertyMap::new()
            .with("name", pair.name.as_str())
            .with("value", &pair.value)
            .into()
    }
}

/// Connection string exposed to the application
#[derive(Debug, Clone)]
pub struct ConnStringInfo {
    pub name: String,
    pub connection_string: Output<String>,
    pub conn_type: ConnectionStringType,
}

impl From<&ConnStringInfo> for PropertyValue {
    fn from(info: &ConnStringInfo) -> Self {
        PropertyMap::new()
            .with("name", info.name.as_str())
            .with("connectionString", &info.connection_string)
            .with("type", info.conn_type.to_string())
            .into()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SiteConfig {
    pub app_settings: Vec<NameValuePair>,
    pub connection_strings: Vec<ConnStringInfo>,
}

impl From<&SiteConfig> for PropertyValue {
    fn from(config: &SiteConfig) -> Self {
        let app_settings: Vec<PropertyValue> =
            config.app_settings.iter().map(PropertyValue::from).collect();
        let connection_strings: Vec<PropertyValue> = config
            .connection_strings
            .iter()
            .map(PropertyValue::from)
            .collect();
        PropertyMap::new()
            .with("appSettings", app_settings)
            .with("connectionStrings", connection_strings)
            .into()
    }
}

/// Arguments for [`WebApp`]
#[derive(Debug, Clone)]
pub struct WebAppArgs<'a> {
    pub resource_group: &'a ResourceGroup,
    /// Resource id of the hosting plan
    pub server_farm_id: Output<String>,
    pub site_config: SiteConfig,
}

/// App Service web application
#[derive(Debug, Clone)]
pub struct WebApp {
    handle: ResourceHandle,
    pub name: Output<String>,
    pub id: Output<String>,
    pub default_host_name: Output<String>,
}

impl WebApp {
    pub const TYPE: &'static str = "azure-native:web:WebApp";

    pub fn new(stack: &mut Stack, name: &str, args: WebAppArgs<'_>) -> Result<Self> {
        tracing::debug!(
            app_settings = args.site_config.app_settings.len(),
            connection_strings = args.site_config.connection_strings.len(),
            "Declaring web app {}",
            name
        );

        let inputs = PropertyMap::new()
            .with("resourceGroupName", &args.resource_group.name)
            .with("serverFarmId", &args.server_farm_id)
            .with("siteConfig", &args.site_config);
        let handle = stack.register(Self::TYPE, name, inputs)?;

        Ok(Self {
            name: stack.output(&handle, "name"),
            id: stack.output(&handle, "id"),
            default_host_name: stack.output(&handle, "defaultHostName"),
            handle,
        })
    }
}

impl AzureResource for WebApp {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}
