#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

use assert_cmd::Command;
use predicates::prelude::*;
mod common;
use common::TestProject;

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("stackflow").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("クラウド構成は、宣言になった"))
        .stdout(predicate::str::contains("preview"))
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("outputs"));
}

/// バージョン表示が正しく動作することを確認
#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("stackflow").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("stackflow"));
}

/// exportコマンドのヘルプが正しく表示されることを確認
#[test]
fn test_export_help() {
    let mut cmd = Command::cargo_bin("stackflow").unwrap();
    cmd.arg("export")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("[STACK]"))
        .stdout(predicate::str::contains("--output"))
        .stdout(predicate::str::contains("--format"));
}

/// upコマンドのヘルプが正しく表示されることを確認
#[test]
fn test_up_help() {
    let mut cmd = Command::cargo_bin("stackflow").unwrap();
    cmd.arg("up")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("[STACK]"))
        .stdout(predicate::str::contains("--engine"))
        .stdout(predicate::str::contains("--yes"));
}

/// 不正なコマンドでエラーになることを確認
#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("stackflow").unwrap();
    cmd.arg("invalid-command").assert().failure();
}

/// 不正な出力形式はパース時に拒否される
#[test]
fn test_export_rejects_unknown_format() {
    let project = TestProject::with_full_stack();
    project
        .command()
        .args(["export", "--format", "toml"])
        .assert()
        .failure();
}

/// プロジェクト外で実行するとエラーになることを確認
#[test]
fn test_preview_without_project() {
    let project = TestProject::new();
    project.command().arg("preview").assert().failure();
}

/// 必須キーが揃っていれば config は成功する
#[test]
fn test_config_all_keys_present() {
    let project = TestProject::with_full_stack();
    project
        .command()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("resourceGroupName = rg-web"))
        .stdout(predicate::str::contains("必須の設定はすべて揃っています"));
}

/// 不足キーは一覧表示され、終了コードは非ゼロ
#[test]
fn test_config_reports_missing_keys() {
    let project = TestProject::new();
    project.write_stack_kdl(
        r#"
project "webstack"

config {
    resourceGroupName "rg-web"
    location "EastUS"
}
"#,
    );

    project
        .command()
        .arg("config")
        .assert()
        .failure()
        .stdout(predicate::str::contains("cosmosAccountName (未設定)"))
        .stdout(predicate::str::contains("frontEndName (未設定)"))
        .stderr(predicate::str::contains("14個の必須キーが未設定です"));
}

/// 環境変数の上書きが config に反映される
#[test]
fn test_config_env_override() {
    let project = TestProject::with_full_stack();
    project
        .command()
        .env("STACKFLOW_CONFIG_LOCATION", "WestEurope")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("location = WestEurope"))
        .stdout(predicate::str::contains("$STACKFLOW_CONFIG_LOCATION"));
}

/// スタック別ファイルが stack.kdl を上書きする
#[test]
fn test_config_stack_layering() {
    let project = TestProject::with_full_stack();
    project.write_file(
        "stack.prod.kdl",
        r#"
config {
    appServiceSKUName "P1v3"
}
"#,
    );

    project
        .command()
        .args(["config", "prod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("appServiceSKUName = P1v3"));

    project
        .command()
        .args(["config", "-s", "dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("appServiceSKUName = B1"));
}
