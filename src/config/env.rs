//! Environment variables
//!
//! `MONODOC_MAX_WORKERS` is interpreted by monodoc. The pass-through
//! variables are forwarded to every builder invocation without being read.

/// Worker count override
pub const MAX_WORKERS: &str = "MONODOC_MAX_WORKERS";

/// Fast build flag forwarded to the builder
pub const FAST_BUILD: &str = "MONODOC_FAST_BUILD";

/// Debug flag forwarded to the builder
pub const DEBUG: &str = "MONODOC_DEBUG";

/// Variables forwarded unmodified to the builder when set
pub const PASS_THROUGH: &[&str] = &[FAST_BUILD, DEBUG];

/// Set for each builder invocation: the package being built
pub const PACKAGE: &str = "MONODOC_PACKAGE";

/// Set for each builder invocation: available optional extensions, comma separated
pub const EXTENSIONS: &str = "MONODOC_EXTENSIONS";
