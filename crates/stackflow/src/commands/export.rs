use crate::utils::LoadedProject;
use colored::Colorize;
use stackflow_cloud::DocumentFormat;
use std::path::PathBuf;

/// デプロイメントドキュメントを書き出す
///
/// 出力先を省略すると標準出力に書き、進捗表示は標準エラーに回します。
pub async fn handle(
    project: &LoadedProject,
    output: Option<PathBuf>,
    format: DocumentFormat,
) -> anyhow::Result<()> {
    let document = project.stack.to_document();
    let content = document.render(format)?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, content).await?;
            eprintln!(
                "{} {} ({}, {})",
                "✓ ドキュメントを書き出しました:".green(),
                path.display().to_string().cyan(),
                format,
                document.summary()
            );
        }
        None => {
            println!("{}", content);
        }
    }

    Ok(())
}
