use crate::commands::outputs;
use crate::utils::{self, LoadedProject};
use colored::Colorize;
use stackflow_cloud::{CommandEngine, Engine, FileEngine, HandoffStore, ResourceStatus};
use std::time::Duration;

pub async fn handle(
    project: &LoadedProject,
    engine_command: Option<String>,
    timeout_secs: Option<u64>,
    yes: bool,
) -> anyhow::Result<()> {
    println!("{}", "スタックを反映します...".blue().bold());
    utils::print_loaded_config_files(&project.root, project.stack.name());
    println!("スタック: {}", project.stack.name().cyan());

    let document = project.stack.to_document();
    println!("{}", document.summary());

    let store = HandoffStore::new(&project.root, project.stack.name());
    let engine: Box<dyn Engine> = match &engine_command {
        Some(command_line) => {
            let mut engine = CommandEngine::from_command_line(command_line)?;
            if let Some(secs) = timeout_secs {
                engine = engine.with_timeout(Duration::from_secs(secs));
            }
            Box::new(engine)
        }
        None => Box::new(FileEngine::new(store.clone())),
    };
    println!("エンジン: {}", engine.name().cyan());

    // 確認（--yesが指定されていない場合）
    if !yes {
        println!();
        println!(
            "{}",
            "警告: エンジンがクラウド上のリソースを作成・更新します。".yellow()
        );
        println!("実行するには --yes オプションを指定してください");
        return Ok(());
    }

    let lock = store.acquire_lock().await?;

    if engine_command.is_some() {
        store.save_document(&document).await?;
    }

    println!();
    println!("{}", "エンジンに送信中...".blue());
    let submitted = engine.submit(&document).await;
    lock.release().await?;
    let report = submitted?;

    // FileEngine の空レポートでオーケストレーターのレポートを上書きしない
    if engine_command.is_some() {
        store.save_report(&report).await?;
    }

    if !report.resources.is_empty() {
        println!();
        println!("{}", "リソース:".bold());
        for declared in project.stack.resources() {
            let Some(state) = report.resources.get(&declared.urn) else {
                continue;
            };
            let status = match state.status {
                ResourceStatus::Created => state.status.to_string().green(),
                ResourceStatus::Updated => state.status.to_string().yellow(),
                ResourceStatus::Failed => state.status.to_string().red(),
                _ => state.status.to_string().dimmed(),
            };
            println!("  {} {} ({})", status, declared.name.cyan(), declared.resource_type);
        }
    }

    if !report.is_success() {
        eprintln!();
        eprintln!("{}", "✗ エンジンが失敗を報告しました".red().bold());
        for failure in &report.failures {
            eprintln!("  {}", failure);
        }
        report.ensure_success()?;
    }

    let resolved = project.stack.resolve(&report);
    tracing::debug!(resolved, "Resolved stack outputs");

    if engine_command.is_none() {
        println!();
        println!(
            "✓ ドキュメントを {} に配置しました",
            store.document_path().display().to_string().cyan()
        );
        println!(
            "  エンジンが {} を書き込んだ後、{} で出力を確認できます",
            store.report_path().display(),
            "stackflow outputs".cyan()
        );
        return Ok(());
    }

    println!();
    outputs::print_exports(&project.stack);
    println!();
    println!(
        "{}",
        format!("✓ 完了しました ({}ms)", report.duration_ms).green().bold()
    );
    Ok(())
}
