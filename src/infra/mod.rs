//! Infrastructure layer
//!
//! Handles filesystem writes and the external builder processes.

pub mod filesystem;
pub mod process;
