//! Core business logic module
//!
//! Discovery, ordering, scheduling and reporting. Builder processes are
//! spawned by [`crate::infra`].
//!
//! # Submodules
//!
//! - [`config`] - Workspace configuration and settings merging
//! - [`package`] - Package descriptors and manifest parsing
//! - [`discovery`] - Package discovery
//! - [`resolver`] - Dependency ordering
//! - [`scheduler`] - Sequential and parallel build scheduling
//! - [`report`] - Build results and run aggregation
//! - [`capabilities`] - Builder and extension availability
//! - [`builder`] - Build orchestration
//! - [`clean`] - Output cleanup

pub mod builder;
pub mod capabilities;
pub mod clean;
pub mod config;
pub mod discovery;
pub mod package;
pub mod report;
pub mod resolver;
pub mod scheduler;
