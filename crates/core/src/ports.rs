//! Repository port for feature bit storage.
//!
//! The evaluator only consumes the read side (`get_all`); the CLI
//! orchestration uses the full contract. Implementations live in
//! `flagbit-infra` (SQLite and the JSON table store).

use async_trait::async_trait;
use flagbit_domain::{FeatureBitDefinition, Result};

/// Port for fetching and mutating feature bit definitions.
///
/// Write operations are check-then-act: `add` verifies name uniqueness
/// before inserting and there is no cross-operation transaction, so a race
/// window exists between the existence check and the write. Callers must
/// tolerate this; the backing store's own guarantees are the only ones
/// provided.
#[async_trait]
pub trait FeatureBitRepository: Send + Sync {
    /// Fetch every definition in the store.
    async fn get_all(&self) -> Result<Vec<FeatureBitDefinition>>;

    /// Look up one definition by its unique name.
    async fn get_by_name(&self, name: &str) -> Result<Option<FeatureBitDefinition>>;

    /// Persist a new definition.
    ///
    /// Assigns the next id (max existing + 1) and returns the stored
    /// definition. Fails with `Conflict` when the name already exists and
    /// `Validation` when the entity fails its field checks.
    async fn add(&self, definition: FeatureBitDefinition) -> Result<FeatureBitDefinition>;

    /// Replace an existing definition, matched by name.
    ///
    /// Fails with `NotFound` when no stored definition has that name.
    async fn update(&self, definition: FeatureBitDefinition) -> Result<()>;

    /// Delete a definition.
    async fn remove(&self, definition: &FeatureBitDefinition) -> Result<()>;
}
