//! スタック設定ファイルの自動発見
//!
//! 読み込み順序（後のものが優先）:
//! ~/.config/stackflow/stack.kdl → stack.kdl → stack.{stack}.kdl → stack.local.kdl

use crate::error::{ConfigError, Result};
use crate::stack::ENV_PREFIX;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// プロジェクト直下の設定ディレクトリ名
pub const PROJECT_DIR: &str = ".stackflow";

/// ルート設定ファイル名
pub const ROOT_FILE: &str = "stack.kdl";

/// ローカルオーバーライドファイル名
pub const LOCAL_FILE: &str = "stack.local.kdl";

/// 発見された設定ファイル群
#[derive(Debug, Clone, Default)]
pub struct DiscoveredFiles {
    /// グローバル設定 (~/.config/stackflow/stack.kdl)
    pub global: Option<PathBuf>,
    /// ルートファイル (stack.kdl)
    pub root: Option<PathBuf>,
    /// スタック固有ファイル (stack.{stack}.kdl)
    pub stack_override: Option<PathBuf>,
    /// ローカルオーバーライド (stack.local.kdl)
    pub local_override: Option<PathBuf>,
}

impl DiscoveredFiles {
    /// 優先度の低い順に並べたファイル一覧
    pub fn layered(&self) -> Vec<&Path> {
        [
            &self.global,
            &self.root,
            &self.stack_override,
            &self.local_override,
        ]
        .into_iter()
        .filter_map(|p| p.as_deref())
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.layered().is_empty()
    }
}

/// プロジェクトルートを検出
///
/// 以下の優先順位で検索:
/// 1. 環境変数 STACKFLOW_PROJECT_ROOT
/// 2. カレントディレクトリから上に向かって stack.kdl / .stackflow/stack.kdl を探す
/// 3. STACKFLOW_STACK_FILE か STACKFLOW_CONFIG_* があればカレントディレクトリ
#[tracing::instrument]
pub fn find_project_root() -> Result<PathBuf> {
    if let Ok(root) = std::env::var("STACKFLOW_PROJECT_ROOT") {
        let path = PathBuf::from(&root);
        debug!(env_root = %root, "Checking STACKFLOW_PROJECT_ROOT");
        if is_project_root(&path) {
            info!(project_root = %path.display(), "Found project root from environment variable");
            return Ok(path);
        }
    }

    let start_dir = std::env::current_dir()?;
    let mut current = start_dir.clone();
    debug!(start_dir = %start_dir.display(), "Searching for project root");

    loop {
        if is_project_root(&current) {
            info!(project_root = %current.display(), "Found project root");
            return Ok(current);
        }

        if !current.pop() {
            break;
        }
    }

    if explicit_stack_file().is_some() || has_env_config() {
        info!(project_root = %start_dir.display(), "Using current directory as project root");
        return Ok(start_dir);
    }

    warn!(start_dir = %start_dir.display(), "Project root not found");
    Err(ConfigError::ProjectRootNotFound(start_dir))
}

/// STACKFLOW_STACK_FILE が存在するファイルを指していればそのパス
fn explicit_stack_file() -> Option<PathBuf> {
    std::env::var_os("STACKFLOW_STACK_FILE")
        .map(PathBuf::from)
        .filter(|path| path.is_file())
}

fn has_env_config() -> bool {
    std::env::vars_os().any(|(name, _)| {
        name.to_str()
            .and_then(|name| name.strip_prefix(ENV_PREFIX))
            .is_some_and(|key| !key.is_empty())
    })
}

fn is_project_root(dir: &Path) -> bool {
    dir.join(ROOT_FILE).exists() || dir.join(PROJECT_DIR).join(ROOT_FILE).exists()
}

/// スタック指定で設定ファイルを発見
///
/// 環境変数 STACKFLOW_STACK_FILE が存在するファイルを指している場合は、
/// そのファイルだけを使用します。
#[tracing::instrument(skip(project_root), fields(project_root = %project_root.display()))]
pub fn discover_stack_files(project_root: &Path, stack: &str) -> Result<DiscoveredFiles> {
    if let Some(path) = explicit_stack_file() {
        debug!(file = %path.display(), "Using STACKFLOW_STACK_FILE");
        return Ok(DiscoveredFiles {
            root: Some(path),
            ..Default::default()
        });
    }
    if let Some(missing) = std::env::var_os("STACKFLOW_STACK_FILE") {
        warn!(file = %PathBuf::from(missing).display(), "STACKFLOW_STACK_FILE does not exist, falling back to discovery");
    }

    let mut discovered = DiscoveredFiles {
        global: dirs::config_dir()
            .map(|dir| dir.join("stackflow").join(ROOT_FILE))
            .filter(|path| path.exists()),
        ..Default::default()
    };

    discovered.root = locate(project_root, ROOT_FILE);
    discovered.stack_override = locate(project_root, &format!("stack.{}.kdl", stack));
    discovered.local_override = locate(project_root, LOCAL_FILE);

    info!(
        files = discovered.layered().len(),
        stack = %stack,
        "Discovered stack files"
    );
    Ok(discovered)
}

/// プロジェクト直下、次に .stackflow/ 内を探す
fn locate(project_root: &Path, file_name: &str) -> Option<PathBuf> {
    let direct = project_root.join(file_name);
    if direct.exists() {
        debug!(file = %direct.display(), "Found config file");
        return Some(direct);
    }

    let nested = project_root.join(PROJECT_DIR).join(file_name);
    if nested.exists() {
        debug!(file = %nested.display(), "Found config file in .stackflow/");
        return Some(nested);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    #[serial]
    fn test_discover_root_and_stack_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("stack.kdl"), "// root").unwrap();
        fs::write(temp_dir.path().join("stack.prod.kdl"), "// prod").unwrap();

        let discovered = discover_stack_files(temp_dir.path(), "prod").unwrap();
        assert!(discovered.root.unwrap().ends_with("stack.kdl"));
        assert!(discovered.stack_override.unwrap().ends_with("stack.prod.kdl"));
        assert!(discovered.local_override.is_none());
    }

    #[test]
    #[serial]
    fn test_other_stack_file_is_ignored() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("stack.prod.kdl"), "// prod").unwrap();

        let discovered = discover_stack_files(temp_dir.path(), "dev").unwrap();
        assert!(discovered.stack_override.is_none());
    }

    #[test]
    #[serial]
    fn test_discover_in_project_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_dir = temp_dir.path().join(PROJECT_DIR);
        fs::create_dir(&project_dir).unwrap();
        fs::write(project_dir.join("stack.local.kdl"), "// local").unwrap();

        let discovered = discover_stack_files(temp_dir.path(), "dev").unwrap();
        assert!(
            discovered
                .local_override
                .unwrap()
                .ends_with(".stackflow/stack.local.kdl")
        );
    }

    #[test]
    #[serial]
    fn test_layered_order() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("stack.kdl"), "").unwrap();
        fs::write(temp_dir.path().join("stack.dev.kdl"), "").unwrap();
        fs::write(temp_dir.path().join("stack.local.kdl"), "").unwrap();

        let discovered = discover_stack_files(temp_dir.path(), "dev").unwrap();
        let names: Vec<_> = discovered
            .layered()
            .into_iter()
            .filter(|p| p.starts_with(temp_dir.path()))
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["stack.kdl", "stack.dev.kdl", "stack.local.kdl"]);
    }

    #[test]
    #[serial]
    fn test_explicit_stack_file_env() {
        let temp_dir = tempfile::tempdir().unwrap();
        let custom = temp_dir.path().join("custom.kdl");
        fs::write(&custom, "// custom").unwrap();
        fs::write(temp_dir.path().join("stack.kdl"), "// ignored").unwrap();

        temp_env::with_var("STACKFLOW_STACK_FILE", Some(&custom), || {
            let discovered = discover_stack_files(temp_dir.path(), "dev").unwrap();
            assert_eq!(discovered.layered(), vec![custom.as_path()]);
        });
    }

    #[test]
    #[serial]
    fn test_find_project_root_walks_up() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        fs::write(temp_dir.path().join("stack.kdl"), "// root").unwrap();
        let nested = temp_dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();

        std::env::set_current_dir(&nested).unwrap();
        let root = find_project_root();
        std::env::set_current_dir(original_dir).unwrap();

        assert_eq!(
            root.unwrap().canonicalize().unwrap(),
            temp_dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    #[serial]
    fn test_find_project_root_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        std::env::set_current_dir(&temp_dir).unwrap();
        let result = find_project_root();
        std::env::set_current_dir(original_dir).unwrap();

        // /tmp より上に stack.kdl が無い前提
        assert!(matches!(result, Err(ConfigError::ProjectRootNotFound(_))));
    }

    #[test]
    #[serial]
    fn test_find_project_root_with_explicit_stack_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let custom = temp_dir.path().join("custom.kdl");
        fs::write(&custom, "// custom").unwrap();
        let original_dir = std::env::current_dir().unwrap();

        std::env::set_current_dir(&temp_dir).unwrap();
        let result = temp_env::with_var("STACKFLOW_STACK_FILE", Some(&custom), find_project_root);
        std::env::set_current_dir(original_dir).unwrap();

        assert_eq!(
            result.unwrap().canonicalize().unwrap(),
            temp_dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    #[serial]
    fn test_find_project_root_with_env_config_only() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        std::env::set_current_dir(&temp_dir).unwrap();
        let result =
            temp_env::with_var("STACKFLOW_CONFIG_LOCATION", Some("EastUS"), find_project_root);
        std::env::set_current_dir(original_dir).unwrap();

        assert!(result.is_ok());
    }
}
