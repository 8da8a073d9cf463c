use crate::topology::REQUIRED_KEYS;
use crate::utils;
use colored::Colorize;
use stackflow_config::{ENV_PREFIX, StackConfig, find_project_root};

/// 必須キーの設定状況を表示
pub fn handle(stack_name: &str) -> anyhow::Result<()> {
    println!("{}", "設定を確認中...".blue());

    let project_root = match find_project_root() {
        Ok(root) => root,
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ プロジェクトルートが見つかりません".red().bold());
            eprintln!("  {}", e);
            eprintln!();
            eprintln!("stack.kdl が存在するディレクトリで実行してください");
            std::process::exit(1);
        }
    };
    println!(
        "プロジェクトルート: {}",
        project_root.display().to_string().cyan()
    );
    utils::print_loaded_config_files(&project_root, stack_name);

    let config = match StackConfig::load(&project_root, stack_name) {
        Ok(config) => config,
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ 設定エラー".red().bold());
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    };

    println!();
    println!(
        "プロジェクト: {}  スタック: {}",
        utils::project_name(&config, &project_root).cyan(),
        stack_name.cyan()
    );
    println!();

    let mut missing = Vec::new();
    for key in REQUIRED_KEYS {
        match (config.get(key), config.source(key)) {
            (Some(value), Some(source)) => {
                println!(
                    "  {} {} = {} {}",
                    "✓".green(),
                    key,
                    value.cyan(),
                    format!("({})", source).dimmed()
                );
            }
            _ => {
                println!("  {} {} {}", "✗".red(), key, "(未設定)".red());
                missing.push(key);
            }
        }
    }

    println!();
    if missing.is_empty() {
        println!("{}", "✓ 必須の設定はすべて揃っています".green().bold());
        return Ok(());
    }

    eprintln!(
        "{}",
        format!("✗ {}個の必須キーが未設定です", missing.len())
            .red()
            .bold()
    );
    eprintln!(
        "  stack.kdl の config ブロックに追加するか、{}<KEY> 環境変数で指定してください",
        ENV_PREFIX
    );
    std::process::exit(1);
}
