use crate::utils::{self, LoadedProject};
use colored::Colorize;
use serde_json::{Map, Value};
use stackflow_cloud::{HandoffStore, Stack};

/// 保存済みレポートから出力を確定させて表示
pub async fn handle(project: &LoadedProject, json: bool) -> anyhow::Result<()> {
    let store = HandoffStore::new(&project.root, project.stack.name());

    match store.load_report().await? {
        Some(report) => {
            project.stack.resolve(&report);
        }
        None if !json => {
            println!(
                "{}",
                format!(
                    "レポートがありません: {}",
                    store.report_path().display()
                )
                .yellow()
            );
        }
        None => {}
    }

    if json {
        let outputs: Map<String, Value> = project
            .stack
            .exports()
            .map(|(name, value)| (name.to_string(), value.resolved().unwrap_or(Value::Null)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&outputs)?);
        return Ok(());
    }

    print_exports(&project.stack);
    Ok(())
}

pub fn print_exports(stack: &Stack) {
    println!("{}", "出力:".bold());
    for (name, value) in stack.exports() {
        match utils::display_value(value) {
            Some(value) => println!("  {} = {}", name.cyan(), value),
            None => println!("  {} = {}", name.cyan(), "(unresolved)".dimmed()),
        }
    }
}
