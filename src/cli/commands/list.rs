//! CLI command for `monodoc list`
//!
//! Prints every discovered package with its documentation directory and
//! declared dependencies.

use anyhow::Result;
use std::path::Path;

use crate::cli::output::{is_json, is_quiet, print_json};
use crate::core::builder::BuildOrchestrator;
use crate::error::EXIT_SUCCESS;

/// Execute the list command
pub async fn execute(root: &Path) -> Result<i32> {
    let orchestrator = BuildOrchestrator::load(root)?;
    let packages = orchestrator.discover()?;

    if is_json() {
        let entries: Vec<serde_json::Value> = packages
            .iter()
            .map(|p| {
                serde_json::json!({
                    "name": p.name,
                    "path": p.root_path,
                    "docs_path": p.docs_path,
                    "dependencies": p.dependencies,
                })
            })
            .collect();
        print_json(&serde_json::json!({
            "status": "success",
            "packages": entries,
        }));
        return Ok(EXIT_SUCCESS);
    }

    if is_quiet() {
        return Ok(EXIT_SUCCESS);
    }

    if packages.is_empty() {
        println!(
            "No packages found in {}",
            orchestrator.layout().packages_dir.display()
        );
        return Ok(EXIT_SUCCESS);
    }

    let root = &orchestrator.layout().root;
    for package in &packages {
        let docs = package
            .docs_path
            .strip_prefix(root)
            .unwrap_or(&package.docs_path);
        println!("{:<24} {}", package.name, docs.display());
        if !package.dependencies.is_empty() {
            let deps: Vec<&str> = package.dependencies.iter().map(String::as_str).collect();
            println!("{:<24} depends on: {}", "", deps.join(", "));
        }
    }
    println!("\n{} packages", packages.len());

    Ok(EXIT_SUCCESS)
}
