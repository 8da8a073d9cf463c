use crate::site;
use crate::utils::{self, LoadedProject};
use colored::Colorize;
use stackflow_azure::AzureResource;
use stackflow_cloud::Urn;

pub fn handle(project: &LoadedProject) -> anyhow::Result<()> {
    println!("{}", "スタックをプレビュー中...".blue());
    utils::print_loaded_config_files(&project.root, project.stack.name());
    println!();
    println!("プロジェクト: {}", project.stack.project().cyan());
    println!("スタック: {}", project.stack.name().cyan());

    let document = project.stack.to_document();
    let summary = document.summary();

    println!();
    println!(
        "{}",
        format!("リソース ({} 個, {} 種類):", summary.resources, summary.by_type.len()).bold()
    );
    for (resource_type, count) in &summary.by_type {
        println!("  {} ({}個)", resource_type.cyan(), count);
        let declared = project
            .web
            .resources()
            .into_iter()
            .filter(|r| r.resource_type() == resource_type)
            .filter_map(|r| project.stack.get(r.urn()));
        for resource in declared {
            if resource.depends_on.is_empty() {
                println!("    • {}", resource.name);
            } else {
                println!(
                    "    • {} {} {}",
                    resource.name,
                    "←".dimmed(),
                    dependency_names(&resource.depends_on).dimmed()
                );
            }
        }
    }

    println!();
    println!("{}", "出力:".bold());
    for (name, value) in project.stack.exports() {
        let target = value
            .as_reference()
            .map(|r| format!("{}.{}", r.urn().name(), r.property()))
            .unwrap_or_else(|| "(値)".to_string());
        println!("  {} = {}", name.cyan(), target);
    }

    let missing = site::missing_assets(&project.stack, &project.root);
    if !missing.is_empty() {
        println!();
        for path in &missing {
            println!(
                "{} アセットが見つかりません: {}",
                "⚠".yellow(),
                path.display().to_string().yellow()
            );
        }
    }

    println!();
    println!("{}", format!("✓ {}", summary).green());
    Ok(())
}

fn dependency_names(urns: &[Urn]) -> String {
    urns.iter().map(Urn::name).collect::<Vec<_>>().join(", ")
}
