//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod clean;
pub mod doctor;
pub mod list;
pub mod plan;

use anyhow::Result;
use clap::Subcommand;
use std::path::Path;

use crate::core::config::DependencyFailurePolicy;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build documentation for every package
    Build {
        /// Remove the output directory before building
        #[arg(long)]
        clean: bool,

        /// Build only this package and its dependencies (repeatable)
        #[arg(short, long, value_name = "NAME")]
        package: Vec<String>,

        /// Build packages one at a time, in dependency order
        #[arg(long)]
        no_parallel: bool,

        /// Maximum number of concurrent builds
        #[arg(short = 'j', long, value_name = "N")]
        max_workers: Option<usize>,

        /// Skip the root documentation build
        #[arg(long)]
        no_root: bool,

        /// Per-package timeout in seconds
        #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
        timeout: Option<u64>,

        /// What to do with packages whose dependency failed
        #[arg(long, value_enum, value_name = "POLICY")]
        on_dependency_failure: Option<DependencyFailurePolicy>,
    },

    /// Show the build order without building
    Plan {
        /// Restrict the plan to this package and its dependencies (repeatable)
        #[arg(short, long, value_name = "NAME")]
        package: Vec<String>,

        /// Leave out the root documentation entry
        #[arg(long)]
        no_root: bool,
    },

    /// List discovered packages
    List,

    /// Check the documentation builder and optional extensions
    Doctor,

    /// Remove the documentation output directory
    Clean,
}

impl Commands {
    /// Execute the command against a monorepo root
    pub async fn run(self, root: &Path) -> Result<i32> {
        match self {
            Self::Build {
                clean,
                package,
                no_parallel,
                max_workers,
                no_root,
                timeout,
                on_dependency_failure,
            } => {
                let options = build::BuildOptions {
                    clean,
                    packages: package,
                    no_parallel,
                    max_workers,
                    no_root,
                    timeout,
                    on_dependency_failure,
                };
                build::execute(root, options).await
            }
            Self::Plan { package, no_root } => plan::execute(root, package, no_root).await,
            Self::List => list::execute(root).await,
            Self::Doctor => doctor::execute(root).await,
            Self::Clean => clean::execute(root).await,
        }
    }
}
