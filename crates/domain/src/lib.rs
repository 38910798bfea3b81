//! # Flagbit Domain
//!
//! Business domain types and models for Flagbit.
//!
//! This crate contains:
//! - The feature bit entity (`FeatureBitDefinition`)
//! - Domain error types and Result definitions
//! - Field-length constants shared by validation and storage
//!
//! ## Architecture
//! - No dependencies on other Flagbit crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use constants::*;
pub use errors::*;
pub use types::*;
