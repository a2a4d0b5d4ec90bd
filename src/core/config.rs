//! Workspace configuration and settings resolution
//!
//! Settings come from four sources: built-in defaults, the workspace file
//! (`monodoc.toml`), environment variables and CLI flags. Each consumer gets
//! an immutable struct produced by a pure merge function; nothing is
//! mutated after construction.
//!
//! Precedence for run-level settings: CLI > environment > file > defaults.
//! Per-package settings layer `[tool.monodoc]` overrides on top of the
//! workspace build defaults.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::config::{defaults, env};
use crate::core::package::PackageOverrides;
use crate::error::ConfigError;

/// What to do with packages whose dependency failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DependencyFailurePolicy {
    /// Report dependents as skipped without building them
    #[default]
    Skip,
    /// Build dependents regardless
    Continue,
}

impl fmt::Display for DependencyFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Continue => write!(f, "continue"),
        }
    }
}

impl FromStr for DependencyFailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "continue" => Ok(Self::Continue),
            other => Err(ConfigError::InvalidValue {
                key: "on_dependency_failure".to_string(),
                message: format!("expected 'skip' or 'continue', got '{other}'"),
            }),
        }
    }
}

/// Contents of `monodoc.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Layout of the monorepo
    #[serde(default)]
    pub workspace: WorkspaceSection,

    /// Build defaults
    #[serde(default)]
    pub build: BuildSection,

    /// Capability probing
    #[serde(default)]
    pub capabilities: CapabilitiesSection,
}

/// `[workspace]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSection {
    /// Name of the root documentation entry
    pub name: Option<String>,
    /// Directory scanned for packages
    pub packages_dir: Option<PathBuf>,
    /// Package manifest file name
    pub manifest: Option<String>,
    /// Documentation directory inside each package
    pub docs_dir: Option<PathBuf>,
    /// Output directory
    pub output_dir: Option<PathBuf>,
    /// Root documentation source directory
    pub root_docs_dir: Option<PathBuf>,
}

/// `[build]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildSection {
    /// Builder program and leading arguments
    pub command: Option<Vec<String>>,
    /// Builder name
    pub builder: Option<String>,
    /// Per-package timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Build packages in parallel
    pub parallel: Option<bool>,
    /// Maximum worker count
    pub max_workers: Option<usize>,
    /// Policy for dependents of failed packages
    pub on_dependency_failure: Option<DependencyFailurePolicy>,
    /// Pass `-W --keep-going` to the builder
    pub warnings_as_errors: Option<bool>,
    /// Extra builder arguments
    #[serde(default)]
    pub extra_args: Vec<String>,
}

/// `[capabilities]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilitiesSection {
    /// Python interpreter used to probe extensions
    pub python: Option<String>,
    /// Optional documentation extensions to probe for
    #[serde(default)]
    pub optional_extensions: Vec<String>,
}

impl WorkspaceConfig {
    /// Load `monodoc.toml` from the monorepo root
    ///
    /// A missing file yields the default configuration.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        Self::load_from_path(&root.join(defaults::WORKSPACE_CONFIG_FILE))
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_toml(&content, path)
    }

    /// Parse configuration from TOML
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }
}

/// Resolved filesystem layout of the monorepo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    /// Monorepo root
    pub root: PathBuf,
    /// Directory scanned for packages
    pub packages_dir: PathBuf,
    /// Whether `packages_dir` came from the configuration file
    pub packages_dir_explicit: bool,
    /// Manifest file name
    pub manifest: String,
    /// Documentation directory inside each package (relative)
    pub docs_dir: PathBuf,
    /// Output directory (absolute)
    pub output_dir: PathBuf,
    /// Root documentation source directory (absolute)
    pub root_docs_dir: PathBuf,
    /// Name of the root documentation entry
    pub root_name: String,
}

impl WorkspaceLayout {
    /// Resolve the layout against a monorepo root
    ///
    /// Without an explicit `packages_dir`, `packages/` is used when it
    /// exists and the root itself otherwise.
    pub fn resolve(root: &Path, config: &WorkspaceConfig) -> Self {
        let section = &config.workspace;

        let (packages_dir, packages_dir_explicit) = match &section.packages_dir {
            Some(dir) => (root.join(dir), true),
            None => {
                let default_dir = root.join(defaults::PACKAGES_DIR);
                if default_dir.is_dir() {
                    (default_dir, false)
                } else {
                    (root.to_path_buf(), false)
                }
            }
        };

        Self {
            root: root.to_path_buf(),
            packages_dir,
            packages_dir_explicit,
            manifest: section
                .manifest
                .clone()
                .unwrap_or_else(|| defaults::MANIFEST_FILE.to_string()),
            docs_dir: section
                .docs_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(defaults::DOCS_DIR)),
            output_dir: root.join(
                section
                    .output_dir
                    .as_deref()
                    .unwrap_or_else(|| Path::new(defaults::OUTPUT_DIR)),
            ),
            root_docs_dir: root.join(
                section
                    .root_docs_dir
                    .as_deref()
                    .unwrap_or_else(|| Path::new(defaults::DOCS_DIR)),
            ),
            root_name: section
                .name
                .clone()
                .unwrap_or_else(|| defaults::ROOT_NAME.to_string()),
        }
    }

    /// Output directory for one package
    pub fn package_output_dir(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    /// Directory holding per-package build logs
    pub fn logs_dir(&self) -> PathBuf {
        self.output_dir.join(defaults::LOGS_SUBDIR)
    }
}

/// Settings read from the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    /// Worker count override
    pub max_workers: Option<usize>,
    /// Variables forwarded unmodified to the builder
    pub pass_through: Vec<(String, String)>,
}

impl EnvOverrides {
    /// Read overrides from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through a lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_workers = match lookup(env::MAX_WORKERS) {
            Some(raw) if !raw.trim().is_empty() => {
                let value: usize = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: env::MAX_WORKERS.to_string(),
                    message: format!("expected a positive integer, got '{raw}'"),
                })?;
                if value == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: env::MAX_WORKERS.to_string(),
                        message: "must be at least 1".to_string(),
                    });
                }
                Some(value)
            }
            _ => None,
        };

        let pass_through = env::PASS_THROUGH
            .iter()
            .filter_map(|key| lookup(key).map(|value| ((*key).to_string(), value)))
            .collect();

        Ok(Self {
            max_workers,
            pass_through,
        })
    }
}

/// Settings given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    /// Remove the output directory before building
    pub clean: bool,
    /// Restrict the run to these packages and their dependencies
    pub packages: Vec<String>,
    /// Force sequential scheduling
    pub no_parallel: bool,
    /// Worker count cap
    pub max_workers: Option<usize>,
    /// Skip the root documentation build
    pub no_root: bool,
    /// Default per-package timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Policy for dependents of failed packages
    pub on_dependency_failure: Option<DependencyFailurePolicy>,
}

/// Run-level settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Schedule on a worker pool
    pub parallel: bool,
    /// Worker pool size (at least 1)
    pub max_workers: usize,
    /// Policy for dependents of failed packages
    pub policy: DependencyFailurePolicy,
    /// Remove the output directory first
    pub clean: bool,
    /// Include the root documentation entry
    pub include_root: bool,
    /// Requested packages (empty means all)
    pub packages: Vec<String>,
}

impl RunSettings {
    /// Merge run-level settings
    ///
    /// `cpus` is the default worker count when nothing sets one explicitly.
    pub fn resolve(
        file: &WorkspaceConfig,
        env: &EnvOverrides,
        cli: &CliOverrides,
        cpus: usize,
    ) -> Self {
        let parallel = !cli.no_parallel && file.build.parallel.unwrap_or(true);

        let max_workers = cli
            .max_workers
            .or(env.max_workers)
            .or(file.build.max_workers)
            .unwrap_or(cpus)
            .clamp(1, defaults::MAX_WORKERS_CAP);

        let packages: Vec<String> = cli
            .packages
            .iter()
            .map(|p| crate::core::package::normalize_name(p))
            .collect();

        Self {
            parallel,
            max_workers,
            policy: cli
                .on_dependency_failure
                .or(file.build.on_dependency_failure)
                .unwrap_or_default(),
            clean: cli.clean,
            include_root: !cli.no_root && packages.is_empty(),
            packages,
        }
    }

    /// Effective worker count: 1 when sequential
    pub fn workers(&self) -> usize {
        if self.parallel {
            self.max_workers
        } else {
            1
        }
    }
}

/// Workspace-wide builder defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDefaults {
    /// Builder program and leading arguments (never empty)
    pub command: Vec<String>,
    /// Builder name
    pub builder: String,
    /// Per-package timeout
    pub timeout: Duration,
    /// Pass `-W --keep-going`
    pub warnings_as_errors: bool,
    /// Extra builder arguments
    pub extra_args: Vec<String>,
}

impl BuildDefaults {
    /// Merge file settings with CLI overrides
    pub fn resolve(file: &WorkspaceConfig, cli: &CliOverrides) -> Result<Self, ConfigError> {
        let command = file
            .build
            .command
            .clone()
            .unwrap_or_else(|| vec![defaults::BUILDER_PROGRAM.to_string()]);
        if command.first().map_or(true, |p| p.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: "build.command".to_string(),
                message: "must name a program".to_string(),
            });
        }

        if file.build.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "build.timeout_secs".to_string(),
                message: "must be at least 1 second".to_string(),
            });
        }
        let timeout_secs = cli
            .timeout_secs
            .or(file.build.timeout_secs)
            .unwrap_or(defaults::BUILD_TIMEOUT_SECS);

        Ok(Self {
            command,
            builder: file
                .build
                .builder
                .clone()
                .unwrap_or_else(|| defaults::BUILDER_NAME.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            warnings_as_errors: file.build.warnings_as_errors.unwrap_or(false),
            extra_args: file.build.extra_args.clone(),
        })
    }

    /// Builder program
    pub fn program(&self) -> &str {
        &self.command[0]
    }
}

/// Settings for a single package build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageBuildSettings {
    /// Builder program and leading arguments
    pub command: Vec<String>,
    /// Builder name
    pub builder: String,
    /// Timeout for this package
    pub timeout: Duration,
    /// Pass `-W --keep-going`
    pub warnings_as_errors: bool,
    /// Extra builder arguments (workspace first, then package)
    pub extra_args: Vec<String>,
    /// Environment variables forwarded to the builder
    pub env: Vec<(String, String)>,
}

impl PackageBuildSettings {
    /// Layer package overrides and environment on top of the workspace defaults
    pub fn merge(
        base: &BuildDefaults,
        overrides: &PackageOverrides,
        env: &EnvOverrides,
    ) -> Self {
        let mut extra_args = base.extra_args.clone();
        extra_args.extend(overrides.extra_args.iter().cloned());

        Self {
            command: base.command.clone(),
            builder: overrides
                .builder
                .clone()
                .unwrap_or_else(|| base.builder.clone()),
            timeout: overrides
                .timeout_secs
                .map_or(base.timeout, Duration::from_secs),
            warnings_as_errors: base.warnings_as_errors,
            extra_args,
            env: env.pass_through.clone(),
        }
    }
}
