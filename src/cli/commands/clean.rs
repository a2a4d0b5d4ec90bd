//! CLI implementation for `monodoc clean` command
//!
//! Removes the documentation output directory.

use anyhow::Result;
use std::path::Path;

use crate::cli::output::{is_json, print_json, print_success};
use crate::core::builder::BuildOrchestrator;
use crate::core::clean::clean_output;
use crate::error::{MonodocError, EXIT_SUCCESS};

/// Execute the clean command
pub async fn execute(root: &Path) -> Result<i32> {
    let orchestrator = BuildOrchestrator::load(root)?;
    let output_dir = &orchestrator.layout().output_dir;

    let result = clean_output(output_dir).map_err(MonodocError::from)?;

    if is_json() {
        print_json(&serde_json::json!({
            "status": "success",
            "path": result.path,
            "removed": result.removed,
        }));
    } else if result.removed {
        print_success(&format!("Removed {}", result.path.display()));
    } else {
        print_success("Nothing to clean");
    }

    Ok(EXIT_SUCCESS)
}
