//! Key-partitioned table storage for feature bit definitions.
//!
//! The table store keeps rows in a single JSON file grouped by partition
//! key; feature bits live in the fixed `"FeatureBits"` partition with the
//! definition name as row key. Legacy rows that carry numeric
//! `DependentIds` instead of name-based `Dependencies` are translated at
//! the read boundary.

pub mod feature_bit_repository;
pub mod store;

pub use feature_bit_repository::TableFeatureBitRepository;
pub use store::{JsonTableStore, TableRow};
