mod commands;
mod site;
mod topology;
mod utils;

use clap::{Parser, Subcommand};
use colored::Colorize;
use stackflow_cloud::DocumentFormat;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stackflow")]
#[command(about = "書いて、渡す。クラウド構成は、宣言になった。", long_about = None)]
struct Cli {
    /// 詳細ログを表示（RUST_LOG が優先されます）
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 宣言されるリソースと依存関係を表示
    Preview {
        /// スタック名 (dev, stg, prod)
        stack: Option<String>,
        /// スタック名 (-s/--stack フラグ、STACKFLOW_STACK 環境変数)
        #[arg(
            short = 's',
            long = "stack",
            env = "STACKFLOW_STACK",
            conflicts_with = "stack",
            hide = true
        )]
        stack_flag: Option<String>,
    },
    /// デプロイメントドキュメントを書き出す
    Export {
        /// スタック名 (dev, stg, prod)
        stack: Option<String>,
        /// スタック名 (-s/--stack フラグ、STACKFLOW_STACK 環境変数)
        #[arg(
            short = 's',
            long = "stack",
            env = "STACKFLOW_STACK",
            conflicts_with = "stack",
            hide = true
        )]
        stack_flag: Option<String>,
        /// 出力先ファイル（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// 出力形式 (json, yaml)
        #[arg(short, long, default_value = "json")]
        format: DocumentFormat,
    },
    /// エンジンにドキュメントを渡して反映
    Up {
        /// スタック名 (dev, stg, prod)
        stack: Option<String>,
        /// スタック名 (-s/--stack フラグ、STACKFLOW_STACK 環境変数)
        #[arg(
            short = 's',
            long = "stack",
            env = "STACKFLOW_STACK",
            conflicts_with = "stack",
            hide = true
        )]
        stack_flag: Option<String>,
        /// エンジンのコマンドライン（省略時は .stackflow/ にドキュメントを配置）
        #[arg(short, long, env = "STACKFLOW_ENGINE")]
        engine: Option<String>,
        /// エンジンのタイムアウト（秒）
        #[arg(long)]
        timeout: Option<u64>,
        /// 確認なしで実行
        #[arg(short, long)]
        yes: bool,
    },
    /// 最後のエンジンレポートからスタックの出力を表示
    Outputs {
        /// スタック名 (dev, stg, prod)
        stack: Option<String>,
        /// スタック名 (-s/--stack フラグ、STACKFLOW_STACK 環境変数)
        #[arg(
            short = 's',
            long = "stack",
            env = "STACKFLOW_STACK",
            conflicts_with = "stack",
            hide = true
        )]
        stack_flag: Option<String>,
        /// JSON で出力
        #[arg(long)]
        json: bool,
    },
    /// 必須設定キーの状況を表示
    Config {
        /// スタック名 (dev, stg, prod)
        stack: Option<String>,
        /// スタック名 (-s/--stack フラグ、STACKFLOW_STACK 環境変数)
        #[arg(
            short = 's',
            long = "stack",
            env = "STACKFLOW_STACK",
            conflicts_with = "stack",
            hide = true
        )]
        stack_flag: Option<String>,
    },
    /// バージョン情報を表示
    Version,
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "stackflow=debug,stackflow_config=debug,stackflow_cloud=debug,stackflow_azure=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // stdout はドキュメント出力に使うので、ログは stderr へ
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Version => {
            println!("stackflow {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Config { stack, stack_flag } => {
            let stack_name = utils::determine_stack_name(stack.or(stack_flag));
            commands::config::handle(&stack_name)?;
        }
        Commands::Preview { stack, stack_flag } => {
            let project = load(stack.or(stack_flag));
            commands::preview::handle(&project)?;
        }
        Commands::Export {
            stack,
            stack_flag,
            output,
            format,
        } => {
            let project = load(stack.or(stack_flag));
            commands::export::handle(&project, output, format).await?;
        }
        Commands::Up {
            stack,
            stack_flag,
            engine,
            timeout,
            yes,
        } => {
            let project = load(stack.or(stack_flag));
            commands::up::handle(&project, engine, timeout, yes).await?;
        }
        Commands::Outputs {
            stack,
            stack_flag,
            json,
        } => {
            let project = load(stack.or(stack_flag));
            commands::outputs::handle(&project, json).await?;
        }
    }

    Ok(())
}

/// 設定のロードと宣言（失敗したら終了）
fn load(stack: Option<String>) -> utils::LoadedProject {
    let stack_name = utils::determine_stack_name(stack);
    match utils::load_project(&stack_name) {
        Ok(project) => project,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            eprintln!();
            eprintln!(
                "{}",
                "ヒント: stackflow config で不足している設定キーを確認できます".yellow()
            );
            std::process::exit(1);
        }
    }
}
