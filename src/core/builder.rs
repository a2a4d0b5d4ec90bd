//! Build orchestration logic
//!
//! Ties discovery, ordering and scheduling together for one monorepo.
//! Loading and planning fail with configuration errors before any builder
//! runs; once a run starts, package failures only show up in the
//! [`BuildRun`].

use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::defaults;
use crate::core::capabilities::CapabilityTable;
use crate::core::clean::clean_output;
use crate::core::config::{
    BuildDefaults, CliOverrides, EnvOverrides, RunSettings, WorkspaceConfig, WorkspaceLayout,
};
use crate::core::discovery::{check_root, PackageDiscoverer};
use crate::core::package::PackageDescriptor;
use crate::core::report::BuildRun;
use crate::core::resolver::BuildPlan;
use crate::core::scheduler::{BuildScheduler, ResultObserver, SchedulerConfig};
use crate::error::MonodocError;
use crate::infra::process::SubprocessBuilder;

/// Everything needed to start a run, resolved up front
#[derive(Debug, Clone)]
pub struct PreparedBuild {
    /// Run-level settings
    pub settings: RunSettings,
    /// Workspace builder defaults
    pub defaults: BuildDefaults,
    /// Packages to build, in order
    pub plan: BuildPlan,
}

/// Build orchestrator for one monorepo
#[derive(Debug, Clone)]
pub struct BuildOrchestrator {
    config: WorkspaceConfig,
    layout: WorkspaceLayout,
    env: EnvOverrides,
}

impl BuildOrchestrator {
    /// Load the workspace at `root`
    pub fn load(root: &Path) -> Result<Self, MonodocError> {
        check_root(root)?;
        let config = WorkspaceConfig::load(root)?;
        let env = EnvOverrides::from_env()?;
        let layout = WorkspaceLayout::resolve(root, &config);

        tracing::debug!("Workspace layout: {layout:?}");

        Ok(Self {
            config,
            layout,
            env,
        })
    }

    /// Replace the environment overrides
    #[must_use]
    pub fn with_env(mut self, env: EnvOverrides) -> Self {
        self.env = env;
        self
    }

    /// Workspace configuration
    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// Resolved layout
    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    /// Discover packages
    pub fn discover(&self) -> Result<Vec<PackageDescriptor>, MonodocError> {
        Ok(PackageDiscoverer::new(&self.layout).discover()?)
    }

    /// Merge run-level settings for these CLI flags
    pub fn settings(&self, cli: &CliOverrides) -> RunSettings {
        RunSettings::resolve(&self.config, &self.env, cli, num_cpus::get())
    }

    /// Discover and order the packages a run would build
    pub fn plan(&self, settings: &RunSettings) -> Result<BuildPlan, MonodocError> {
        let discoverer = PackageDiscoverer::new(&self.layout);
        let mut packages = discoverer.discover()?;

        if settings.include_root {
            if let Some(root) = discoverer.root_entry(&packages)? {
                packages.push(root);
            }
        }

        let plan = BuildPlan::resolve(packages)?;
        if settings.packages.is_empty() {
            Ok(plan)
        } else {
            Ok(plan.restrict_to(&settings.packages)?)
        }
    }

    /// Resolve everything a build needs without touching the filesystem
    pub fn prepare(&self, cli: &CliOverrides) -> Result<PreparedBuild, MonodocError> {
        let settings = self.settings(cli);
        let defaults = BuildDefaults::resolve(&self.config, cli)?;
        let plan = self.plan(&settings)?;

        tracing::info!(
            "Planned {} packages: {}",
            plan.len(),
            plan.names().join(", ")
        );

        Ok(PreparedBuild {
            settings,
            defaults,
            plan,
        })
    }

    /// Probe the builder, interpreter and optional extensions
    pub async fn capabilities(
        &self,
        defaults: &BuildDefaults,
        cancel: &CancellationToken,
    ) -> CapabilityTable {
        let python = self
            .config
            .capabilities
            .python
            .as_deref()
            .unwrap_or(defaults::PYTHON_PROGRAM);
        CapabilityTable::resolve(
            defaults.program(),
            python,
            &self.config.capabilities.optional_extensions,
            cancel,
        )
        .await
    }

    /// Run a prepared build
    ///
    /// Only fails if the output directory cannot be cleaned; everything
    /// that goes wrong afterwards is recorded per package.
    pub async fn execute(
        &self,
        prepared: &PreparedBuild,
        cancel: CancellationToken,
        observer: Option<ResultObserver>,
    ) -> Result<BuildRun, MonodocError> {
        if prepared.settings.clean {
            clean_output(&self.layout.output_dir)?;
        }

        let capabilities = self.capabilities(&prepared.defaults, &cancel).await;
        if !capabilities.builder_available() {
            tracing::warn!(
                "Builder '{}' not found on PATH; package builds will fail",
                prepared.defaults.program()
            );
        }

        let builder = SubprocessBuilder::new(
            prepared.defaults.clone(),
            self.env.clone(),
            capabilities.available_extensions(),
            self.layout.clone(),
        );

        let config = SchedulerConfig {
            parallel: prepared.settings.parallel,
            max_workers: prepared.settings.workers(),
            policy: prepared.settings.policy,
        };

        let mut scheduler = BuildScheduler::new(Arc::new(builder), config, cancel);
        if let Some(observer) = observer {
            scheduler = scheduler.with_observer(observer);
        }

        Ok(scheduler.run(&prepared.plan).await)
    }

    /// Prepare and run a build
    pub async fn build(
        &self,
        cli: &CliOverrides,
        cancel: CancellationToken,
        observer: Option<ResultObserver>,
    ) -> Result<BuildRun, MonodocError> {
        let prepared = self.prepare(cli)?;
        self.execute(&prepared, cancel, observer).await
    }
}
