//! Error types for monodoc
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Process exit code for a run where every requested build succeeded
pub const EXIT_SUCCESS: i32 = 0;

/// Process exit code for a run with at least one failed or skipped build
pub const EXIT_BUILD_FAILED: i32 = 1;

/// Process exit code for configuration errors (no builds attempted)
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// Process exit code when a second interrupt aborts shutdown
pub const EXIT_INTERRUPTED: i32 = 130;

/// Configuration errors
///
/// All of these are fatal and surface before any build starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Monorepo root does not exist
    #[error("Root directory not found: {path}")]
    RootNotFound { path: PathBuf },

    /// Monorepo root exists but is not a directory
    #[error("Root path is not a directory: {path}")]
    RootNotDirectory { path: PathBuf },

    /// Configured packages directory does not exist
    #[error("Packages directory not found: {path}")]
    PackagesDirNotFound { path: PathBuf },

    /// Two directories declare the same package name
    #[error("Duplicate package name '{name}' declared in '{first}' and '{second}'")]
    DuplicatePackage {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Package name cannot be used as an output directory name
    #[error("Invalid package name '{name}' in '{path}': {reason}")]
    InvalidPackageName {
        name: String,
        path: PathBuf,
        reason: String,
    },

    /// Root documentation entry collides with a package
    #[error("Root documentation name '{name}' collides with a package of the same name")]
    RootNameCollision { name: String },

    /// Failed to read a configuration or manifest file
    #[error("Failed to read '{path}': {error}")]
    ReadError { path: PathBuf, error: String },

    /// Failed to parse a configuration or manifest file
    #[error("Failed to parse '{path}': {error}")]
    ParseError { path: PathBuf, error: String },

    /// Invalid value in a configuration source
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Dependency resolution errors
#[derive(Error, Debug)]
pub enum ResolverError {
    /// Circular dependency detected
    #[error("Circular dependency detected: {}", render_cycle(cycle))]
    CircularDependency { cycle: Vec<String> },

    /// A requested package is not part of the discovered set
    #[error("Package '{name}' not found in workspace")]
    UnknownPackage { name: String },
}

fn render_cycle(cycle: &[String]) -> String {
    let mut parts: Vec<&str> = cycle.iter().map(String::as_str).collect();
    if let Some(first) = cycle.first() {
        parts.push(first);
    }
    parts.join(" -> ")
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },
}

/// Per-package build errors
///
/// These never abort a run; the scheduler turns them into failed results.
#[derive(Error, Debug)]
pub enum BuildError {
    /// Builder exited with a non-zero status
    #[error("{status}: {output}")]
    NonZeroExit { status: String, output: String },

    /// Builder exceeded the per-package timeout
    #[error("timeout after {secs}s")]
    Timeout { secs: u64 },

    /// Builder process could not be started
    #[error("failed to spawn '{program}': {error}")]
    Spawn { program: String, error: String },

    /// Run was cancelled while the builder was running
    #[error("cancelled")]
    Cancelled,

    /// Filesystem failure while preparing or logging the build
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    /// Waiting on the builder process failed
    #[error("failed to wait for builder: {0}")]
    Wait(String),
}

/// Top-level monodoc error type
#[derive(Error, Debug)]
pub enum MonodocError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Resolver error
    #[error("{0}")]
    Resolver(#[from] ResolverError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),
}

impl MonodocError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Resolver(_) => EXIT_CONFIG_ERROR,
            Self::Filesystem(_) => EXIT_BUILD_FAILED,
        }
    }
}
