//! # Flagbit Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The SQLite repository (r2d2-pooled rusqlite)
//! - The key-partitioned JSON table-store repository
//!
//! ## Architecture
//! - Implements traits defined in `flagbit-core`
//! - Depends on `flagbit-domain` and `flagbit-core`
//! - Contains all "impure" code (database and file I/O)

pub mod database;
pub mod table_store;

// Re-export commonly used items
pub use database::{DbManager, SqliteFeatureBitRepository};
pub use table_store::{JsonTableStore, TableFeatureBitRepository};
