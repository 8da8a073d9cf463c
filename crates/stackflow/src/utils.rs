use crate::topology::{self, WebStack};
use colored::Colorize;
use serde_json::Value;
use stackflow_cloud::{PropertyValue, Stack};
use stackflow_config::{StackConfig, discover_stack_files, find_project_root};
use std::path::{Path, PathBuf};

/// スタック未指定時の既定値
pub const DEFAULT_STACK: &str = "dev";

/// スタック名を決定する（共通ロジック）
pub fn determine_stack_name(stack: Option<String>) -> String {
    stack.unwrap_or_else(|| DEFAULT_STACK.to_string())
}

/// 設定を読み込み、トポロジーを宣言したプロジェクト
pub struct LoadedProject {
    pub root: PathBuf,
    pub stack: Stack,
    pub web: WebStack,
}

/// プロジェクトルートを探し、設定をロードしてトポロジーを宣言
pub fn load_project(stack_name: &str) -> anyhow::Result<LoadedProject> {
    let root = find_project_root()?;
    let config = StackConfig::load(&root, stack_name)?;

    let mut stack = Stack::new(project_name(&config, &root), stack_name);
    let web = topology::declare_from_config(&mut stack, &config)?;

    Ok(LoadedProject { root, stack, web })
}

/// プロジェクト名（設定の `project`、なければディレクトリ名）
pub fn project_name(config: &StackConfig, project_root: &Path) -> String {
    config
        .project()
        .map(str::to_string)
        .or_else(|| {
            project_root
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
        })
        .unwrap_or_else(|| "stackflow".to_string())
}

/// 読み込んだ設定ファイル情報を表示
pub fn print_loaded_config_files(project_root: &Path, stack: &str) {
    let Ok(files) = discover_stack_files(project_root, stack) else {
        return;
    };
    if files.is_empty() {
        return;
    }

    println!("📄 読み込んだ設定ファイル:");
    for path in files.layered() {
        println!("  • {}", path.display().to_string().cyan());
    }
}

/// 出力値を表示用の文字列にする（未確定なら None）
pub fn display_value(value: &PropertyValue) -> Option<String> {
    value.resolved().map(|resolved| match resolved {
        Value::String(s) => s,
        other => other.to_string(),
    })
}
