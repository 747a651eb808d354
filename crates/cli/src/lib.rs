//! Command-line front end for ring nodes.
//!
//! Provides commands for:
//! - Running a node and joining it to a ring
//! - Inspecting a node's neighbours and leader
//! - Starting an election
//! - Asking a node to leave the ring

pub mod commands;
pub mod config;

pub use commands::{Command, CommandResult};
pub use config::CliConfig;
