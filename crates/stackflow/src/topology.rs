//! Web スタックのトポロジー
//!
//! リソースグループ、Cosmos DB、ストレージ、App Service、Application
//! Insights、静的サイトを1回の評価で宣言します。

use crate::site::{self, PublishedSite};
use anyhow::Context;
use stackflow_azure::{
    AppServicePlan, AppServicePlanArgs, AzureResource, Component, ComponentArgs, ConnStringInfo,
    ConnectionStringType, ConsistencyPolicy, DatabaseAccount, DatabaseAccountArgs,
    DatabaseAccountOfferType, DefaultConsistencyLevel, Location, NameValuePair, ResourceGroup,
    ResourceGroupArgs, SiteConfig, SkuDescription, SqlResourceSqlDatabase,
    SqlResourceSqlDatabaseArgs, StorageAccount, StorageAccountArgs, WebApp, WebAppArgs,
};
use stackflow_cloud::{Output, Stack, interpolate};
use stackflow_config::StackConfig;

/// 必須の設定キー
pub const REQUIRED_KEYS: [&str; 16] = [
    "resourceGroupName",
    "location",
    "cosmosAccountName",
    "cosmosDBName",
    "storageName",
    "storageKind",
    "storageSKU",
    "appServiceName",
    "appServiceKind",
    "appServiceSKUName",
    "appServiceSKUTier",
    "appInsightsName",
    "appInsightsKind",
    "appInsightsType",
    "webAppName",
    "frontEndName",
];

/// スタックの出力名
pub const STATIC_ENDPOINT_EXPORT: &str = "staticEndpoint";

/// 宣言に使う設定値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebStackConfig {
    pub resource_group_name: String,
    pub location: String,
    pub cosmos_account_name: String,
    pub cosmos_db_name: String,
    pub storage_name: String,
    pub storage_kind: String,
    pub storage_sku: String,
    pub app_service_name: String,
    pub app_service_kind: String,
    pub app_service_sku_name: String,
    pub app_service_sku_tier: String,
    pub app_insights_name: String,
    pub app_insights_kind: String,
    pub app_insights_type: String,
    pub web_app_name: String,
    pub front_end_name: String,
}

impl WebStackConfig {
    /// 必須キーをすべて解決
    ///
    /// 1つでも欠けていれば、不足キーをすべて列挙したエラーを返します。
    pub fn from_config(config: &StackConfig) -> stackflow_config::Result<Self> {
        config.require_all(&REQUIRED_KEYS)?;
        let get = |key: &str| config.require(key).map(str::to_string);

        Ok(Self {
            resource_group_name: get("resourceGroupName")?,
            location: get("location")?,
            cosmos_account_name: get("cosmosAccountName")?,
            cosmos_db_name: get("cosmosDBName")?,
            storage_name: get("storageName")?,
            storage_kind: get("storageKind")?,
            storage_sku: get("storageSKU")?,
            app_service_name: get("appServiceName")?,
            app_service_kind: get("appServiceKind")?,
            app_service_sku_name: get("appServiceSKUName")?,
            app_service_sku_tier: get("appServiceSKUTier")?,
            app_insights_name: get("appInsightsName")?,
            app_insights_kind: get("appInsightsKind")?,
            app_insights_type: get("appInsightsType")?,
            web_app_name: get("webAppName")?,
            front_end_name: get("frontEndName")?,
        })
    }
}

/// 宣言済みリソースのハンドル
#[derive(Debug, Clone)]
pub struct WebStack {
    pub resource_group: ResourceGroup,
    pub cosmos_account: DatabaseAccount,
    pub cosmos_database: SqlResourceSqlDatabase,
    pub storage_account: StorageAccount,
    pub app_service_plan: AppServicePlan,
    pub app_insights: Component,
    pub web_app: WebApp,
    pub site: PublishedSite,
}

impl WebStack {
    /// 宣言順のリソース
    pub fn resources(&self) -> Vec<&dyn AzureResource> {
        let mut resources: Vec<&dyn AzureResource> = vec![
            &self.resource_group,
            &self.cosmos_account,
            &self.cosmos_database,
            &self.storage_account,
            &self.app_service_plan,
            &self.app_insights,
            &self.web_app,
            &self.site.website,
        ];
        resources.extend(self.site.blobs.iter().map(|blob| blob as &dyn AzureResource));
        resources
    }
}

/// 設定を解決してからトポロジーを宣言
///
/// 設定が不足している場合はリソースを1つも宣言せずに失敗します。
pub fn declare_from_config(stack: &mut Stack, config: &StackConfig) -> anyhow::Result<WebStack> {
    let cfg = WebStackConfig::from_config(config)?;
    declare(stack, &cfg).with_context(|| format!("スタック '{}' の宣言に失敗しました", stack.name()))
}

/// トポロジーを宣言
pub fn declare(stack: &mut Stack, cfg: &WebStackConfig) -> stackflow_azure::Result<WebStack> {
    let resource_group = ResourceGroup::new(
        stack,
        &cfg.resource_group_name,
        ResourceGroupArgs {
            resource_group_name: Some(cfg.resource_group_name.clone()),
            location: cfg.location.clone(),
        },
    )?;

    // Cosmos DB
    let cosmos_account = DatabaseAccount::new(
        stack,
        &cfg.cosmos_account_name,
        DatabaseAccountArgs {
            resource_group: &resource_group,
            offer_type: DatabaseAccountOfferType::Standard,
            locations: vec![Location {
                location_name: Output::known(cfg.location.as_str()),
                failover_priority: 0,
            }],
            consistency_policy: ConsistencyPolicy {
                default_consistency_level: DefaultConsistencyLevel::Session,
            },
        },
    )?;

    let cosmos_database = SqlResourceSqlDatabase::new(
        stack,
        &cfg.cosmos_db_name,
        SqlResourceSqlDatabaseArgs {
            resource_group: &resource_group,
            account: &cosmos_account,
            database_id: cfg.cosmos_db_name.clone(),
        },
    )?;

    let storage_account = StorageAccount::new(
        stack,
        &cfg.storage_name,
        StorageAccountArgs {
            resource_group: &resource_group,
            kind: cfg.storage_kind.clone(),
            sku_name: cfg.storage_sku.clone(),
        },
    )?;

    // App Service
    let app_service_plan = AppServicePlan::new(
        stack,
        &cfg.app_service_name,
        AppServicePlanArgs {
            resource_group: &resource_group,
            kind: cfg.app_service_kind.clone(),
            sku: SkuDescription {
                name: cfg.app_service_sku_name.clone(),
                tier: cfg.app_service_sku_tier.clone(),
            },
        },
    )?;

    let app_insights = Component::new(
        stack,
        &cfg.app_insights_name,
        ComponentArgs {
            resource_group: &resource_group,
            kind: cfg.app_insights_kind.clone(),
            application_type: cfg.app_insights_type.clone(),
        },
    )?;

    // 接続文字列はアカウントのエンドポイントそのもの（認証情報は含まない）
    let db_connection_string = cosmos_account.document_endpoint.clone();

    let web_app = WebApp::new(
        stack,
        &cfg.web_app_name,
        WebAppArgs {
            resource_group: &resource_group,
            server_farm_id: app_service_plan.id.clone(),
            site_config: SiteConfig {
                app_settings: vec![
                    NameValuePair::new(
                        "APPINSIGHTS_INSTRUMENTATIONKEY",
                        &app_insights.instrumentation_key,
                    ),
                    NameValuePair::new(
                        "APPLICATIONINSIGHTS_CONNECTION_STRING",
                        interpolate!("InstrumentationKey=", &app_insights.instrumentation_key),
                    ),
                    NameValuePair::new("ApplicationInsightsAgent_EXTENSION_VERSION", "~2"),
                ],
                connection_strings: vec![ConnStringInfo {
                    name: "db".to_string(),
                    connection_string: db_connection_string,
                    conn_type: ConnectionStringType::DocDb,
                }],
            },
        },
    )?;

    // 静的サイト
    let site = site::publish(
        stack,
        &cfg.front_end_name,
        &resource_group,
        &storage_account,
    )?;

    stack.export(STATIC_ENDPOINT_EXPORT, &storage_account.primary_endpoints.web);

    tracing::info!(
        stack = %stack.name(),
        resources = stack.len(),
        "Declared web stack"
    );

    Ok(WebStack {
        resource_group,
        cosmos_account,
        cosmos_database,
        storage_account,
        app_service_plan,
        app_insights,
        web_app,
        site,
    })
}
