//! Mock repository implementation for testing
//!
//! Provides an in-memory mock of the `FeatureBitRepository` port, enabling
//! deterministic unit tests without database dependencies.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use flagbit_core::ports::FeatureBitRepository;
use flagbit_domain::{FeatureBitDefinition, FlagbitError, Result as DomainResult};

/// In-memory mock for `FeatureBitRepository`.
///
/// Stores definitions behind a mutex and mirrors the conflict/not-found
/// behavior of the real backends.
#[derive(Default, Clone)]
pub struct MockFeatureBitRepository {
    definitions: Arc<Mutex<Vec<FeatureBitDefinition>>>,
}

impl MockFeatureBitRepository {
    /// Create a new mock seeded with the provided definitions.
    pub fn new(definitions: Vec<FeatureBitDefinition>) -> Self {
        Self { definitions: Arc::new(Mutex::new(definitions)) }
    }

    /// Convenience helper for adding a single definition to the mock.
    pub fn with_definition(self, definition: FeatureBitDefinition) -> Self {
        self.definitions.lock().expect("mock lock poisoned").push(definition);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<FeatureBitDefinition>> {
        self.definitions.lock().expect("mock lock poisoned")
    }
}

#[async_trait]
impl FeatureBitRepository for MockFeatureBitRepository {
    async fn get_all(&self) -> DomainResult<Vec<FeatureBitDefinition>> {
        Ok(self.lock().clone())
    }

    async fn get_by_name(&self, name: &str) -> DomainResult<Option<FeatureBitDefinition>> {
        Ok(self.lock().iter().find(|definition| definition.name == name).cloned())
    }

    async fn add(
        &self,
        mut definition: FeatureBitDefinition,
    ) -> DomainResult<FeatureBitDefinition> {
        definition.validate()?;
        let mut definitions = self.lock();
        if definitions.iter().any(|existing| existing.name == definition.name) {
            return Err(FlagbitError::Conflict(format!(
                "cannot add, feature bit with name '{}' already exists",
                definition.name
            )));
        }
        definition.id = definitions.iter().map(|existing| existing.id).max().unwrap_or(0) + 1;
        definitions.push(definition.clone());
        Ok(definition)
    }

    async fn update(&self, definition: FeatureBitDefinition) -> DomainResult<()> {
        let mut definitions = self.lock();
        let existing = definitions
            .iter_mut()
            .find(|existing| existing.name == definition.name)
            .ok_or_else(|| {
                FlagbitError::NotFound(format!(
                    "feature bit '{}' could not be found",
                    definition.name
                ))
            })?;
        existing.apply_update(&definition);
        Ok(())
    }

    async fn remove(&self, definition: &FeatureBitDefinition) -> DomainResult<()> {
        self.lock().retain(|existing| existing.name != definition.name);
        Ok(())
    }
}

/// Build a minimal valid definition for tests.
pub fn definition(id: i32, name: &str) -> FeatureBitDefinition {
    let now = Utc::now();
    FeatureBitDefinition {
        id,
        name: name.to_string(),
        on_off: false,
        excluded_environments: None,
        included_environments: None,
        minimum_allowed_permission_level: 0,
        exact_allowed_permission_level: None,
        allowed_users: None,
        dependencies: None,
        created_date_time: now,
        created_by_user: "tester".into(),
        last_modified_date_time: now,
        last_modified_by_user: "tester".into(),
    }
}
