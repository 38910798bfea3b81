//! SQLite-backed storage for feature bit definitions.

pub mod feature_bit_repository;
pub mod manager;

pub use feature_bit_repository::SqliteFeatureBitRepository;
pub use manager::DbManager;
