//! # Flagbit CLI
//!
//! Command-line front end for managing feature bit definitions: add,
//! remove, list and generate against either storage backend.

pub mod cli;
pub mod commands;
pub mod context;
pub mod output;

pub use cli::{Cli, Command, ConnectionArgs};
pub use context::CommandContext;
