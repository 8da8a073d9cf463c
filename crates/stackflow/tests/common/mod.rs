use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// すべての必須キーを含む stack.kdl
pub const FULL_STACK_KDL: &str = r#"
project "webstack"

config {
    resourceGroupName "rg-web"
    location "EastUS"
    cosmosAccountName "web-cosmos"
    cosmosDBName "appdb"
    storageName "websitestore"
    storageKind "StorageV2"
    storageSKU "Standard_LRS"
    appServiceName "web-plan"
    appServiceKind "App"
    appServiceSKUName "B1"
    appServiceSKUTier "Basic"
    appInsightsName "web-insights"
    appInsightsKind "web"
    appInsightsType "web"
    webAppName "web-app"
    frontEndName "frontend"
}
"#;

/// FULL_STACK_KDL と同じ値（環境変数で渡す用）
#[allow(dead_code)]
pub const FULL_STACK_VALUES: [(&str, &str); 16] = [
    ("resourceGroupName", "rg-web"),
    ("location", "EastUS"),
    ("cosmosAccountName", "web-cosmos"),
    ("cosmosDBName", "appdb"),
    ("storageName", "websitestore"),
    ("storageKind", "StorageV2"),
    ("storageSKU", "Standard_LRS"),
    ("appServiceName", "web-plan"),
    ("appServiceKind", "App"),
    ("appServiceSKUName", "B1"),
    ("appServiceSKUTier", "Basic"),
    ("appInsightsName", "web-insights"),
    ("appInsightsKind", "web"),
    ("appInsightsType", "web"),
    ("webAppName", "web-app"),
    ("frontEndName", "frontend"),
];

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    /// 必須キーが揃ったプロジェクト
    pub fn with_full_stack() -> Self {
        let project = Self::new();
        project.write_stack_kdl(FULL_STACK_KDL);
        project
    }

    pub fn write_stack_kdl(&self, content: &str) {
        fs::write(self.root.path().join("stack.kdl"), content).unwrap();
    }

    #[allow(dead_code)]
    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[allow(dead_code)]
    pub fn write_site(&self) {
        self.write_file("websrc/index.html", "<h1>Hello</h1>");
        self.write_file("websrc/404.html", "<h1>Not found</h1>");
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    /// プロジェクト内で実行する stackflow コマンド（ホストの環境変数から隔離）
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("stackflow").unwrap();
        cmd.current_dir(self.path())
            .env_clear()
            .env("PATH", std::env::var("PATH").unwrap_or_default())
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join(".xdg"))
            .env("NO_COLOR", "1");
        cmd
    }
}
