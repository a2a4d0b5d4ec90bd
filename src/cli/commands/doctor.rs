//! CLI command for `monodoc doctor`
//!
//! Checks the documentation builder, the Python interpreter and the
//! configured optional extensions.

use anyhow::Result;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use crate::cli::output::{
    is_json, is_quiet, print_detail, print_info, print_json, print_success, print_warning, status,
};
use crate::core::builder::BuildOrchestrator;
use crate::core::capabilities::CapabilityKind;
use crate::core::config::{BuildDefaults, CliOverrides};
use crate::error::{MonodocError, EXIT_BUILD_FAILED, EXIT_SUCCESS};

/// Execute the doctor command
pub async fn execute(root: &Path) -> Result<i32> {
    let orchestrator = BuildOrchestrator::load(root)?;
    let defaults = BuildDefaults::resolve(orchestrator.config(), &CliOverrides::default())
        .map_err(MonodocError::from)?;
    let table = orchestrator
        .capabilities(&defaults, &CancellationToken::new())
        .await;
    let ready = table.builder_available();
    let code = if ready { EXIT_SUCCESS } else { EXIT_BUILD_FAILED };

    // JSON output mode
    if is_json() {
        print_json(&serde_json::json!({
            "status": if ready { "success" } else { "error" },
            "command": defaults.command,
            "capabilities": table.entries().collect::<Vec<_>>(),
        }));
        return Ok(code);
    }

    // Quiet mode - only show errors
    if is_quiet() {
        if !ready {
            eprintln!("{} Missing builder: {}", status::ERROR, defaults.program());
        }
        return Ok(code);
    }

    print_info("Checking documentation toolchain...");
    println!();

    for capability in table.entries() {
        let kind = match capability.kind {
            CapabilityKind::Builder => "builder",
            CapabilityKind::Interpreter => "interpreter",
            CapabilityKind::Extension => "extension [optional]",
        };
        let symbol = if capability.available {
            status::SUCCESS
        } else {
            status::ERROR
        };
        println!("  {symbol} {} ({kind})", capability.name);
        if let Some(detail) = &capability.detail {
            print_detail(&format!("  {detail}"));
        }
    }

    println!();
    if ready {
        print_success("Builder available");
        let missing = table
            .entries()
            .filter(|c| c.kind == CapabilityKind::Extension && !c.available)
            .count();
        if missing > 0 {
            print_warning(&format!(
                "{missing} optional extension(s) missing; builds will run without them"
            ));
        }
    } else {
        println!(
            "{} Builder '{}' not found. Install Sphinx or set build.command in monodoc.toml.",
            status::ERROR,
            defaults.program()
        );
    }

    Ok(code)
}
