//! Configuration constants
//!
//! - [`defaults`] - Default values for workspace and build settings
//! - [`env`] - Environment variable names read or forwarded by monodoc

pub mod defaults;
pub mod env;
