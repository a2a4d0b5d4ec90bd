//! Build scheduling
//!
//! Runs one builder invocation per package of a [`BuildPlan`], either
//! strictly in plan order or on a bounded pool of tokio tasks. A package is
//! dispatched only after all of its in-plan dependencies have completed.
//! Individual failures never stop the run.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::core::config::DependencyFailurePolicy;
use crate::core::package::PackageDescriptor;
use crate::core::report::{BuildResult, BuildRun, BuildStatus};
use crate::core::resolver::BuildPlan;
use crate::error::BuildError;

/// Outcome of a single builder invocation
#[derive(Debug)]
pub struct BuildOutcome {
    /// Captured builder log, if one was written
    pub log_path: Option<PathBuf>,
    /// Why the build failed, if it did
    pub error: Option<BuildError>,
}

impl BuildOutcome {
    /// A successful build
    pub fn success(log_path: Option<PathBuf>) -> Self {
        Self {
            log_path,
            error: None,
        }
    }

    /// A failed build
    pub fn failure(error: BuildError, log_path: Option<PathBuf>) -> Self {
        Self {
            log_path,
            error: Some(error),
        }
    }
}

/// Builds the documentation of one package
#[async_trait]
pub trait DocBuilder: Send + Sync {
    /// Build a package, giving up early when `cancel` fires
    async fn build(&self, package: &PackageDescriptor, cancel: &CancellationToken) -> BuildOutcome;
}

/// Callback invoked as each result is recorded
pub type ResultObserver = Arc<dyn Fn(&BuildResult) + Send + Sync>;

/// Scheduler configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Use the worker pool
    pub parallel: bool,
    /// Worker pool size
    pub max_workers: usize,
    /// What happens to dependents of a failed package
    pub policy: DependencyFailurePolicy,
}

/// Detail recorded for packages not started because of cancellation
pub const CANCELLED_DETAIL: &str = "cancelled";

/// Runs package builds for a plan
pub struct BuildScheduler {
    builder: Arc<dyn DocBuilder>,
    config: SchedulerConfig,
    cancel: CancellationToken,
    observer: Option<ResultObserver>,
}

/// Bookkeeping shared by both scheduling modes
struct RunState {
    run: BuildRun,
    /// Packages whose dependents must not build under the skip policy
    broken: HashSet<String>,
    observer: Option<ResultObserver>,
}

impl RunState {
    fn record(&mut self, result: BuildResult) {
        if result.status != BuildStatus::Success {
            self.broken.insert(result.package_name.clone());
        }
        match result.status {
            BuildStatus::Success => tracing::info!("Built {}", result.package_name),
            BuildStatus::Failed => tracing::warn!(
                "Build failed for {}: {}",
                result.package_name,
                result.summary_line().unwrap_or("unknown error")
            ),
            BuildStatus::Skipped => tracing::info!(
                "Skipped {}: {}",
                result.package_name,
                result.summary_line().unwrap_or("")
            ),
        }
        if let Some(observer) = &self.observer {
            observer(&result);
        }
        self.run.record(result);
    }
}

impl BuildScheduler {
    /// Create a scheduler
    pub fn new(
        builder: Arc<dyn DocBuilder>,
        config: SchedulerConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            builder,
            config,
            cancel,
            observer: None,
        }
    }

    /// Observe results as they are recorded
    #[must_use]
    pub fn with_observer(mut self, observer: ResultObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Build every package of the plan
    pub async fn run(&self, plan: &BuildPlan) -> BuildRun {
        let mut state = RunState {
            run: BuildRun::start(plan.names()),
            broken: HashSet::new(),
            observer: self.observer.clone(),
        };

        if self.config.parallel && self.config.max_workers > 1 {
            tracing::info!(
                "Building {} packages with {} workers",
                plan.len(),
                self.config.max_workers
            );
            self.run_parallel(plan, &mut state).await;
        } else {
            tracing::info!("Building {} packages sequentially", plan.len());
            self.run_sequential(plan, &mut state).await;
        }

        let mut run = state.run;
        run.finish(self.cancel.is_cancelled());
        run
    }

    async fn run_sequential(&self, plan: &BuildPlan, state: &mut RunState) {
        for package in plan.packages() {
            if let Some(result) = self.precheck(plan, package, &state.broken) {
                state.record(result);
                continue;
            }
            let result = execute(self.builder.as_ref(), package, &self.cancel).await;
            state.record(result);
        }
    }

    async fn run_parallel(&self, plan: &BuildPlan, state: &mut RunState) {
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers));
        let mut tasks: JoinSet<BuildResult> = JoinSet::new();
        let mut task_names: HashMap<tokio::task::Id, String> = HashMap::new();
        let mut pending: Vec<&PackageDescriptor> = plan.packages().iter().collect();

        loop {
            // Dispatch everything whose dependencies have completed. Results
            // recorded without running can unblock more packages, so repeat
            // until a pass makes no progress.
            let mut progressed = true;
            while progressed {
                progressed = false;
                let mut index = 0;
                while index < pending.len() {
                    let package = pending[index];
                    let ready = plan
                        .dependencies_of(&package.name)
                        .iter()
                        .all(|dep| state.run.contains(dep));
                    if !ready {
                        index += 1;
                        continue;
                    }
                    pending.remove(index);

                    if let Some(result) = self.precheck(plan, package, &state.broken) {
                        state.record(result);
                        progressed = true;
                        continue;
                    }

                    let builder = Arc::clone(&self.builder);
                    let cancel = self.cancel.clone();
                    let semaphore = Arc::clone(&semaphore);
                    let package = package.clone();
                    let name = package.name.clone();

                    let handle = tasks.spawn(async move {
                        let permit = tokio::select! {
                            permit = semaphore.acquire_owned() => permit.ok(),
                            () = cancel.cancelled() => None,
                        };
                        let Some(_permit) = permit else {
                            return BuildResult::skipped(&package.name, CANCELLED_DETAIL);
                        };
                        execute(builder.as_ref(), &package, &cancel).await
                    });
                    task_names.insert(handle.id(), name);
                }
            }

            let Some(joined) = tasks.join_next_with_id().await else {
                break;
            };

            let result = match joined {
                Ok((id, result)) => {
                    task_names.remove(&id);
                    result
                }
                Err(e) => {
                    let name = task_names.remove(&e.id()).unwrap_or_default();
                    tracing::error!("Build task for '{name}' did not complete: {e}");
                    BuildResult::failed(&name, 0.0, format!("unexpected error: {e}"), None)
                }
            };
            state.record(result);
        }

        // Only reachable if a dependency never completed, which an acyclic
        // plan rules out.
        for package in pending {
            state.record(BuildResult::skipped(
                &package.name,
                "dependencies did not complete",
            ));
        }
    }

    /// Result for a package that must not be built, if any
    fn precheck(
        &self,
        plan: &BuildPlan,
        package: &PackageDescriptor,
        broken: &HashSet<String>,
    ) -> Option<BuildResult> {
        if self.cancel.is_cancelled() {
            return Some(BuildResult::skipped(&package.name, CANCELLED_DETAIL));
        }

        if self.config.policy == DependencyFailurePolicy::Skip {
            if let Some(dep) = plan
                .dependencies_of(&package.name)
                .iter()
                .find(|dep| broken.contains(*dep))
            {
                return Some(BuildResult::skipped(
                    &package.name,
                    format!("dependency '{dep}' failed"),
                ));
            }
        }

        None
    }
}

/// Run one build and time it
async fn execute(
    builder: &dyn DocBuilder,
    package: &PackageDescriptor,
    cancel: &CancellationToken,
) -> BuildResult {
    tracing::info!("Building package: {}", package.name);
    let started = Instant::now();
    let outcome = builder.build(package, cancel).await;
    let elapsed = started.elapsed().as_secs_f64();

    match outcome.error {
        None => BuildResult::success(&package.name, elapsed, outcome.log_path),
        Some(error) => {
            BuildResult::failed(&package.name, elapsed, error.to_string(), outcome.log_path)
        }
    }
}
