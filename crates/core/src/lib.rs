//! # Flagbit Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The feature bit evaluation engine
//! - Dependency-list codec and write-path dependency validation
//! - Port/adapter interfaces (traits)
//!
//! ## Architecture Principles
//! - Only depends on `flagbit-domain`
//! - No database or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod dependencies;
pub mod evaluator;
pub mod validation;

// Infrastructure ports
pub mod ports;

// Re-export specific items to avoid ambiguity
pub use dependencies::{join_names, split_ids, split_names};
pub use evaluator::{EvaluationContext, FeatureBitEvaluator, MAX_DEPENDENCY_DEPTH};
pub use ports::FeatureBitRepository;
pub use validation::{validate_dependencies, DependencyEdge};
