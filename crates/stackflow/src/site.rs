//! 静的サイトの公開
//!
//! ストレージアカウントの静的 Web サイト機能を有効にし、固定の2ファイルを
//! `$web` コンテナへアップロードする Blob として宣言します。

use stackflow_azure::{
    Blob, BlobArgs, ResourceGroup, StorageAccount, StorageAccountStaticWebsite,
    StorageAccountStaticWebsiteArgs,
};
use stackflow_cloud::{FileAsset, PropertyValue, Stack};
use std::path::{Path, PathBuf};

/// アップロード元ディレクトリ（プロジェクトルートからの相対パス）
pub const SOURCE_DIR: &str = "./websrc";

pub const INDEX_DOCUMENT: &str = "index.html";
pub const ERROR_DOCUMENT: &str = "404.html";

/// アップロードするファイル（ディレクトリ走査はしない）
pub const SITE_FILES: [&str; 2] = [INDEX_DOCUMENT, ERROR_DOCUMENT];

pub const CONTENT_TYPE: &str = "text/html";

/// 宣言済みの静的サイト
#[derive(Debug, Clone)]
pub struct PublishedSite {
    pub website: StorageAccountStaticWebsite,
    pub blobs: Vec<Blob>,
}

/// 静的 Web サイトと Blob を宣言
pub fn publish(
    stack: &mut Stack,
    name: &str,
    resource_group: &ResourceGroup,
    account: &StorageAccount,
) -> stackflow_azure::Result<PublishedSite> {
    let website = StorageAccountStaticWebsite::new(
        stack,
        name,
        StorageAccountStaticWebsiteArgs {
            resource_group,
            account,
            index_document: Some(INDEX_DOCUMENT.to_string()),
            error404_document: Some(ERROR_DOCUMENT.to_string()),
        },
    )?;

    let blobs = SITE_FILES
        .iter()
        .map(|file| {
            Blob::new(
                stack,
                file,
                BlobArgs {
                    resource_group,
                    account,
                    container_name: website.container_name.clone(),
                    source: FileAsset::new(format!("{}/{}", SOURCE_DIR, file)),
                    content_type: Some(CONTENT_TYPE.to_string()),
                },
            )
        })
        .collect::<stackflow_azure::Result<Vec<_>>>()?;

    tracing::debug!(site = %name, blobs = blobs.len(), "Declared static site");

    Ok(PublishedSite { website, blobs })
}

/// `base` から見て存在しないアセットを列挙
pub fn missing_assets(stack: &Stack, base: &Path) -> Vec<PathBuf> {
    stack
        .by_type(Blob::TYPE)
        .into_iter()
        .filter_map(|blob| match blob.input("source") {
            Some(PropertyValue::Asset(asset)) if !asset.exists_in(base) => {
                Some(asset.path().to_path_buf())
            }
            _ => None,
        })
        .collect()
}
