//! スタック設定ファイル (KDL) のパース

use crate::error::{ConfigError, Result};
use kdl::{KdlDocument, KdlNode};
use std::collections::BTreeMap;

/// 1ファイル分のパース結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedStackFile {
    /// project ノードで指定されたプロジェクト名
    pub project: Option<String>,
    /// config ブロック内のキーと値
    pub values: BTreeMap<String, String>,
}

/// KDL文字列をパース
///
/// ```kdl
/// project "webstack"
///
/// config {
///     resourceGroupName "rg-web"
///     "webstack:location" "EastUS"
/// }
/// ```
pub fn parse_stack_str(content: &str) -> Result<ParsedStackFile> {
    let doc: KdlDocument = content.parse()?;
    let mut parsed = ParsedStackFile::default();

    for node in doc.nodes() {
        match node.name().value() {
            "project" => {
                parsed.project = first_string(node).map(|s| s.to_string());
            }
            "config" => {
                if let Some(children) = node.children() {
                    for child in children.nodes() {
                        let key = child.name().value().to_string();
                        let value = first_string(child).ok_or_else(|| ConfigError::InvalidValue {
                            key: key.clone(),
                            message: "文字列の値が必要です".to_string(),
                        })?;
                        parsed.values.insert(key, value.to_string());
                    }
                }
            }
            // 不明なノードはスキップ
            _ => {}
        }
    }

    Ok(parsed)
}

fn first_string(node: &KdlNode) -> Option<&str> {
    node.entries().first().and_then(|e| e.value().as_string())
}
