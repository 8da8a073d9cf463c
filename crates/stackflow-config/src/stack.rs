//! スタック設定
//!
//! 発見した設定ファイルを優先度順に重ね合わせ、環境変数で上書きします。

use crate::discovery::discover_stack_files;
use crate::error::{ConfigError, Result};
use crate::parser::parse_stack_str;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// 環境変数による上書きのプレフィックス
///
/// `resourceGroupName` は `STACKFLOW_CONFIG_RESOURCEGROUPNAME` で上書きできます。
pub const ENV_PREFIX: &str = "STACKFLOW_CONFIG_";

/// 設定値の出どころ
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    File(PathBuf),
    Env(String),
    Inline,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::File(path) => write!(f, "{}", path.display()),
            ValueSource::Env(name) => write!(f, "${}", name),
            ValueSource::Inline => write!(f, "(inline)"),
        }
    }
}

/// スタック単位の設定
#[derive(Debug, Clone, Default)]
pub struct StackConfig {
    stack: String,
    project: Option<String>,
    values: BTreeMap<String, (String, ValueSource)>,
    env_values: BTreeMap<String, (String, ValueSource)>,
}

impl StackConfig {
    /// 空の設定を作成
    pub fn new(stack: impl Into<String>) -> Self {
        Self {
            stack: stack.into(),
            ..Default::default()
        }
    }

    /// プロジェクトルートからスタック設定をロード
    ///
    /// 設定ファイルも環境変数も見つからない場合はエラーになります。
    #[instrument(skip(project_root), fields(project_root = %project_root.display()))]
    pub fn load(project_root: &Path, stack: &str) -> Result<Self> {
        let discovered = discover_stack_files(project_root, stack)?;
        let mut config = Self::new(stack);

        for path in discovered.layered() {
            let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            let layer = Self::from_kdl_str_with_source(
                stack,
                &content,
                ValueSource::File(path.to_path_buf()),
            )?;
            debug!(file = %path.display(), keys = layer.values.len(), "Merging stack file");
            config.merge(layer);
        }

        config.capture_env();

        if discovered.is_empty() && config.env_values.is_empty() {
            return Err(ConfigError::StackFileNotFound);
        }

        info!(
            stack = %stack,
            keys = config.len(),
            "Stack configuration loaded"
        );
        Ok(config)
    }

    /// KDL文字列から設定を作成（環境変数は参照しない）
    pub fn from_kdl_str(stack: &str, content: &str) -> Result<Self> {
        Self::from_kdl_str_with_source(stack, content, ValueSource::Inline)
    }

    fn from_kdl_str_with_source(stack: &str, content: &str, source: ValueSource) -> Result<Self> {
        let parsed = parse_stack_str(content)?;
        let mut config = Self::new(stack);
        config.project = parsed.project;
        config.values = parsed
            .values
            .into_iter()
            .map(|(k, v)| (k, (v, source.clone())))
            .collect();
        Ok(config)
    }

    /// 値を直接設定
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values
            .insert(key.into(), (value.into(), ValueSource::Inline));
    }

    /// 別の設定を重ねる（other が優先）
    pub fn merge(&mut self, other: StackConfig) {
        if other.project.is_some() {
            self.project = other.project;
        }
        self.values.extend(other.values);
        self.env_values.extend(other.env_values);
    }

    /// STACKFLOW_CONFIG_* 環境変数を取り込む
    pub fn capture_env(&mut self) {
        for (name, value) in std::env::vars() {
            if let Some(key) = name.strip_prefix(ENV_PREFIX)
                && !key.is_empty()
            {
                debug!(env = %name, "Captured config override from environment");
                self.env_values.insert(
                    key.to_ascii_uppercase(),
                    (value, ValueSource::Env(name.clone())),
                );
            }
        }
    }

    pub fn stack(&self) -> &str {
        &self.stack
    }

    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    /// 値を取得
    ///
    /// 環境変数 → `key` → `{project}:{key}` → 任意の `{ns}:{key}` の順で探します。
    /// 空白だけの値は未設定として扱います。
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lookup(key).map(|(value, _)| value.as_str())
    }

    /// 値とその出どころを取得
    pub fn source(&self, key: &str) -> Option<&ValueSource> {
        self.lookup(key).map(|(_, source)| source)
    }

    fn lookup(&self, key: &str) -> Option<&(String, ValueSource)> {
        self.raw_lookup(key)
            .filter(|(value, _)| !value.trim().is_empty())
    }

    fn raw_lookup(&self, key: &str) -> Option<&(String, ValueSource)> {
        if let Some(entry) = self.env_values.get(&key.to_ascii_uppercase()) {
            return Some(entry);
        }
        if let Some(entry) = self.values.get(key) {
            return Some(entry);
        }
        if let Some(entry) = self
            .project
            .as_ref()
            .and_then(|project| self.values.get(&format!("{}:{}", project, key)))
        {
            return Some(entry);
        }
        self.values.iter().find_map(|(name, entry)| {
            name.split_once(':')
                .filter(|(_, bare)| *bare == key)
                .map(|_| entry)
        })
    }

    /// 必須の値を取得
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingKeys(vec![key.to_string()]))
    }

    /// 複数の必須値をまとめて取得
    ///
    /// 不足しているキーはすべて1つのエラーに列挙されます（要求順）。
    pub fn require_all<'a>(&'a self, keys: &[&str]) -> Result<Vec<&'a str>> {
        let missing: Vec<String> = keys
            .iter()
            .filter(|key| self.get(key).is_none())
            .map(|key| key.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(ConfigError::MissingKeys(missing));
        }

        Ok(keys.iter().filter_map(|key| self.get(key)).collect())
    }

    /// ファイル由来のキー一覧
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len() + self.env_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
