//! CLI command for `monodoc plan`
//!
//! Prints the resolved build order without running any builder.

use anyhow::Result;
use std::path::Path;

use crate::cli::output::{is_json, is_quiet, print_json};
use crate::core::builder::BuildOrchestrator;
use crate::core::config::CliOverrides;
use crate::error::EXIT_SUCCESS;

/// Execute the plan command
pub async fn execute(root: &Path, packages: Vec<String>, no_root: bool) -> Result<i32> {
    let orchestrator = BuildOrchestrator::load(root)?;
    let cli = CliOverrides {
        packages,
        no_root,
        ..Default::default()
    };
    let settings = orchestrator.settings(&cli);
    let plan = orchestrator.plan(&settings)?;

    if is_json() {
        let packages: Vec<serde_json::Value> = plan
            .packages()
            .iter()
            .map(|p| {
                serde_json::json!({
                    "name": p.name,
                    "docs_path": p.docs_path,
                    "dependencies": plan.dependencies_of(&p.name),
                    "root": p.is_root,
                })
            })
            .collect();
        print_json(&serde_json::json!({
            "status": "success",
            "parallel": settings.parallel,
            "max_workers": settings.workers(),
            "on_dependency_failure": settings.policy.to_string(),
            "order": plan.names(),
            "packages": packages,
        }));
        return Ok(EXIT_SUCCESS);
    }

    if is_quiet() {
        return Ok(EXIT_SUCCESS);
    }

    if plan.is_empty() {
        println!("No packages to build");
        return Ok(EXIT_SUCCESS);
    }

    println!(
        "Build order ({} packages, {}):",
        plan.len(),
        if settings.parallel {
            format!("up to {} workers", settings.workers())
        } else {
            "sequential".to_string()
        }
    );
    for (index, package) in plan.packages().iter().enumerate() {
        let deps = plan.dependencies_of(&package.name);
        if deps.is_empty() {
            println!("{:>3}. {}", index + 1, package.name);
        } else {
            println!(
                "{:>3}. {} (after {})",
                index + 1,
                package.name,
                deps.join(", ")
            );
        }
    }

    Ok(EXIT_SUCCESS)
}
