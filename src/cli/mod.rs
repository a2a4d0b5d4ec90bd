//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::error::{MonodocError, EXIT_BUILD_FAILED, EXIT_SUCCESS};
use commands::Commands;

/// Monodoc - documentation builds for monorepos
///
/// Discovers the packages of a monorepo, orders them by their declared
/// dependencies and builds each package's documentation.
#[derive(Parser, Debug)]
#[command(name = "monodoc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Monorepo root (defaults to the current directory)
    #[arg(short = 'C', long = "directory", value_name = "DIR", global = true)]
    pub directory: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Execute the CLI command, returning the process exit code
    pub async fn run(self) -> Result<i32> {
        let Some(cmd) = self.command else {
            // No subcommand provided, show help
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            return Ok(EXIT_SUCCESS);
        };

        let root = resolve_root(self.directory)?;
        tracing::debug!("Monorepo root: {}", root.display());
        cmd.run(&root).await
    }
}

/// Absolute monorepo root
///
/// A path that does not exist is returned as given so that the workspace
/// loader reports it.
fn resolve_root(directory: Option<PathBuf>) -> Result<PathBuf> {
    let root = match directory {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    Ok(std::fs::canonicalize(&root).unwrap_or(root))
}

/// Exit code for an error that ended a command
///
/// Configuration and resolver errors exit with 2, everything else with 1.
pub fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<MonodocError>()
        .map_or(EXIT_BUILD_FAILED, MonodocError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, EXIT_CONFIG_ERROR};

    #[test]
    fn test_parse_build_flags() {
        let cli = Cli::try_parse_from([
            "monodoc",
            "-vv",
            "--json",
            "-C",
            "/repo",
            "build",
            "--clean",
            "--package",
            "core",
            "--package",
            "agents",
            "--no-parallel",
            "--on-dependency-failure",
            "continue",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert!(cli.json);
        assert_eq!(cli.directory, Some(PathBuf::from("/repo")));
        match cli.command {
            Some(Commands::Build {
                clean,
                package,
                no_parallel,
                on_dependency_failure,
                ..
            }) => {
                assert!(clean);
                assert!(no_parallel);
                assert_eq!(package, vec!["core", "agents"]);
                assert_eq!(
                    on_dependency_failure,
                    Some(crate::core::config::DependencyFailurePolicy::Continue)
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(Cli::try_parse_from(["monodoc", "build", "--timeout", "0"]).is_err());
    }

    #[test]
    fn test_exit_code_from_error() {
        let err: anyhow::Error = MonodocError::from(ConfigError::RootNotFound {
            path: PathBuf::from("/nope"),
        })
        .into();
        assert_eq!(exit_code(&err), EXIT_CONFIG_ERROR);

        let err = err.context("while loading");
        assert_eq!(exit_code(&err), EXIT_CONFIG_ERROR);

        assert_eq!(exit_code(&anyhow::anyhow!("other")), EXIT_BUILD_FAILED);
    }
}
