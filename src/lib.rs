//! Monodoc - documentation builds for monorepos
//!
//! This library discovers the packages of a monorepo, orders them by their
//! declared dependencies and runs an external documentation builder
//! (`sphinx-build` by default) once per package, sequentially or on a
//! bounded worker pool.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Discovery, ordering, scheduling and reporting
//! - [`infra`] - Infrastructure layer (filesystem, builder processes)
//! - [`config`] - Configuration constants and environment variable names
//! - [`error`] - Error types and exit codes

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
