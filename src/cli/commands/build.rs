//! Build command implementation
//!
//! Implements `monodoc build`: plans the run, builds every package with a
//! progress bar, then prints the per-package report.

use anyhow::Result;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::cli::output::{
    create_build_bar, is_json, is_quiet, print_detail, print_json, print_warning, status,
};
use crate::core::builder::BuildOrchestrator;
use crate::core::config::{CliOverrides, DependencyFailurePolicy};
use crate::core::report::{BuildResult, BuildRun, BuildStatus};
use crate::error::{EXIT_INTERRUPTED, EXIT_SUCCESS};

/// Build options
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Remove the output directory first
    pub clean: bool,
    /// Build only these packages and their dependencies
    pub packages: Vec<String>,
    /// Build sequentially
    pub no_parallel: bool,
    /// Worker count
    pub max_workers: Option<usize>,
    /// Skip the root documentation build
    pub no_root: bool,
    /// Per-package timeout in seconds
    pub timeout: Option<u64>,
    /// Policy for dependents of failed packages
    pub on_dependency_failure: Option<DependencyFailurePolicy>,
}

impl From<BuildOptions> for CliOverrides {
    fn from(options: BuildOptions) -> Self {
        Self {
            clean: options.clean,
            packages: options.packages,
            no_parallel: options.no_parallel,
            max_workers: options.max_workers,
            no_root: options.no_root,
            timeout_secs: options.timeout,
            on_dependency_failure: options.on_dependency_failure,
        }
    }
}

/// Execute the build command
pub async fn execute(root: &Path, options: BuildOptions) -> Result<i32> {
    let orchestrator = BuildOrchestrator::load(root)?;
    let cli: CliOverrides = options.into();
    let prepared = orchestrator.prepare(&cli)?;

    if prepared.plan.is_empty() {
        if is_json() {
            print_json(&serde_json::json!({
                "status": "success",
                "summary": { "succeeded": 0, "failed": 0, "skipped": 0, "total": 0 },
                "results": [],
            }));
        } else {
            print_warning(&format!(
                "No packages with documentation found in {}",
                orchestrator.layout().packages_dir.display()
            ));
        }
        return Ok(EXIT_SUCCESS);
    }

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if watch_interrupts(tokio::signal::ctrl_c, interrupt).await {
            std::process::exit(EXIT_INTERRUPTED);
        }
    });

    let bar = create_build_bar(prepared.plan.len() as u64);
    bar.set_message("starting");
    let progress = bar.clone();
    let observer = Arc::new(move |result: &BuildResult| {
        progress.inc(1);
        progress.set_message(result.package_name.clone());
        if result.status == BuildStatus::Failed {
            progress.println(format!(
                "{} {}: {}",
                status::ERROR,
                result.package_name,
                result.summary_line().unwrap_or("failed")
            ));
        }
    });

    let run = orchestrator
        .execute(&prepared, cancel, Some(observer))
        .await?;
    bar.finish_and_clear();

    report(&run, orchestrator.layout().logs_dir().as_path());
    Ok(run.exit_code())
}

/// Cancel the run on the first interrupt
///
/// Returns `true` when a second interrupt arrives, `false` if the signal
/// listener stops before that.
async fn watch_interrupts<F, Fut>(mut next_interrupt: F, cancel: CancellationToken) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    while next_interrupt().await.is_ok() {
        if cancel.is_cancelled() {
            tracing::warn!("Interrupted again; exiting");
            return true;
        }
        tracing::warn!("Interrupted; cancelling remaining builds (Ctrl-C again to force quit)");
        cancel.cancel();
    }
    false
}

fn report(run: &BuildRun, logs_dir: &Path) {
    if is_json() {
        print_json(&run.to_json());
        return;
    }

    if is_quiet() {
        for result in run.results() {
            if result.status != BuildStatus::Success {
                eprintln!(
                    "{} {}: {}",
                    status::ERROR,
                    result.package_name,
                    result.summary_line().unwrap_or_default()
                );
            }
        }
        return;
    }

    print!("{}", run.render_text());
    if !run.is_success() {
        print_detail(&format!("Build logs: {}", logs_dir.display()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_map_to_cli_overrides() {
        let options = BuildOptions {
            clean: true,
            packages: vec!["core".to_string()],
            timeout: Some(30),
            on_dependency_failure: Some(DependencyFailurePolicy::Continue),
            ..Default::default()
        };
        let cli: CliOverrides = options.into();
        assert!(cli.clean);
        assert_eq!(cli.packages, vec!["core"]);
        assert_eq!(cli.timeout_secs, Some(30));
        assert_eq!(
            cli.on_dependency_failure,
            Some(DependencyFailurePolicy::Continue)
        );
        assert!(!cli.no_root);
    }

    #[tokio::test]
    async fn test_second_interrupt_forces_quit() {
        let cancel = CancellationToken::new();
        let mut calls = 0;
        let forced = watch_interrupts(
            || {
                calls += 1;
                std::future::ready(Ok(()))
            },
            cancel.clone(),
        )
        .await;

        assert!(forced);
        assert!(cancel.is_cancelled());
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_single_interrupt_only_cancels() {
        let cancel = CancellationToken::new();
        let mut signals = vec![
            Err(std::io::Error::other("listener closed")),
            Ok(()),
        ];
        let forced = watch_interrupts(
            || std::future::ready(signals.pop().unwrap_or(Ok(()))),
            cancel.clone(),
        )
        .await;

        assert!(!forced);
        assert!(cancel.is_cancelled());
    }
}
