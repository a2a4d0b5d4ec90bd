//! Default configuration values

/// Workspace configuration file at the monorepo root
pub const WORKSPACE_CONFIG_FILE: &str = "monodoc.toml";

/// Directory scanned for packages when present
pub const PACKAGES_DIR: &str = "packages";

/// Package manifest file name
pub const MANIFEST_FILE: &str = "pyproject.toml";

/// Documentation source directory inside a package
pub const DOCS_DIR: &str = "docs";

/// Output directory, relative to the monorepo root
pub const OUTPUT_DIR: &str = "_build/docs";

/// Subdirectory of the output directory holding per-package build logs
pub const LOGS_SUBDIR: &str = "logs";

/// Name of the root (aggregator) documentation entry
pub const ROOT_NAME: &str = "root";

/// External documentation builder program
pub const BUILDER_PROGRAM: &str = "sphinx-build";

/// Sphinx builder name
pub const BUILDER_NAME: &str = "html";

/// Per-package build timeout (in seconds)
pub const BUILD_TIMEOUT_SECS: u64 = 900; // 15 minutes

/// Upper bound on the worker pool size
pub const MAX_WORKERS_CAP: usize = 32;

/// Python interpreter used to probe optional extensions
pub const PYTHON_PROGRAM: &str = "python3";

/// Lines of builder output kept in a failure's error detail
pub const ERROR_DETAIL_LINES: usize = 20;

/// Time allowed for the optional extension import probe (in seconds)
pub const PROBE_TIMEOUT_SECS: u64 = 30;
