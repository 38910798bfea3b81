//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Manage feature bit definitions in a SQLite database or a JSON table
/// store.
#[derive(Debug, Parser)]
#[command(name = "flagbit", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Backend selection. Exactly one of the two stores must be given.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct ConnectionArgs {
    /// Path to the SQLite database file
    #[arg(long, env = "FLAGBIT_DATABASE")]
    pub database: Option<PathBuf>,

    /// Path to the JSON table-store file
    #[arg(long = "table-store", env = "FLAGBIT_TABLE_STORE")]
    pub table_store: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a feature bit (or overwrite one with --force)
    Add(AddArgs),
    /// Remove a feature bit
    Remove(RemoveArgs),
    /// List feature bits
    List(ListArgs),
    /// Generate a Rust enum of feature bit keys
    Generate(GenerateArgs),
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Unique name of the feature bit
    #[arg(long)]
    pub name: String,

    /// Baseline state ("true" or "false"; anything unparseable counts as
    /// false)
    #[arg(long, default_value = "false")]
    pub onoff: String,

    /// Comma-separated environments in which the feature is forced off
    #[arg(long = "excluded-environments")]
    pub excluded_environments: Option<String>,

    /// Comma-separated environments in which alone the feature is on
    #[arg(long = "included-environments")]
    pub included_environments: Option<String>,

    /// Minimum caller permission level required
    #[arg(long = "minimum-permission-level", default_value_t = 0)]
    pub minimum_permission_level: i32,

    /// Exact caller permission level required (overrides the minimum)
    #[arg(long = "exact-permission-level")]
    pub exact_permission_level: Option<i32>,

    /// Comma-separated allow-list of users (stored, not evaluated)
    #[arg(long = "allowed-users")]
    pub allowed_users: Option<String>,

    /// Comma-separated names of feature bits this one depends on
    #[arg(long)]
    pub dependencies: Option<String>,

    /// Overwrite the definition when the name already exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Name of the feature bit to remove
    #[arg(long)]
    pub name: String,

    /// Also strip the name from other definitions' dependency lists
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Show every column instead of just id and name
    #[arg(long)]
    pub long: bool,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// File to write; must not already exist
    #[arg(long, default_value = "features.rs")]
    pub output: PathBuf,

    /// Name of the generated enum type
    #[arg(long = "type-name", default_value = "FeatureBit")]
    pub type_name: String,
}
