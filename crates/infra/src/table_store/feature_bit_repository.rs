//! Table-store feature bit repository.
//!
//! Implements the `FeatureBitRepository` port over [`JsonTableStore`]. Every
//! operation loads the file, works on the `"FeatureBits"` partition and, for
//! writes, saves the whole store back. File I/O runs in `spawn_blocking`.

use std::sync::Arc;

use async_trait::async_trait;
use flagbit_core::ports::FeatureBitRepository;
use flagbit_domain::{FeatureBitDefinition, FlagbitError, Result as DomainResult, FEATURE_BITS_TABLE};
use tokio::task;
use tracing::info;

use super::store::{JsonTableStore, Partition, TableRow};

/// Feature bit repository over the key-partitioned JSON table store.
pub struct TableFeatureBitRepository {
    store: Arc<JsonTableStore>,
}

impl TableFeatureBitRepository {
    /// Create a new repository over the given store.
    pub fn new(store: Arc<JsonTableStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl FeatureBitRepository for TableFeatureBitRepository {
    async fn get_all(&self) -> DomainResult<Vec<FeatureBitDefinition>> {
        let store = Arc::clone(&self.store);

        task::spawn_blocking(move || -> DomainResult<Vec<FeatureBitDefinition>> {
            let partition = load_partition(&store)?;
            let mut definitions = partition
                .values()
                .map(|row| row.to_definition(&partition))
                .collect::<DomainResult<Vec<_>>>()?;
            definitions.sort_by_key(|definition| definition.id);
            Ok(definitions)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get_by_name(&self, name: &str) -> DomainResult<Option<FeatureBitDefinition>> {
        let store = Arc::clone(&self.store);
        let name = name.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<FeatureBitDefinition>> {
            let partition = load_partition(&store)?;
            partition.get(&name).map(|row| row.to_definition(&partition)).transpose()
        })
        .await
        .map_err(map_join_error)?
    }

    async fn add(&self, definition: FeatureBitDefinition) -> DomainResult<FeatureBitDefinition> {
        definition.validate()?;
        let store = Arc::clone(&self.store);

        let stored = task::spawn_blocking(move || -> DomainResult<FeatureBitDefinition> {
            let mut partitions = store.load()?;
            let partition = partitions.entry(FEATURE_BITS_TABLE.to_string()).or_default();

            if partition.contains_key(&definition.name) {
                return Err(FlagbitError::Conflict(format!(
                    "cannot add, feature bit with name '{}' already exists",
                    definition.name
                )));
            }

            let mut definition = definition;
            definition.id = partition.values().map(|row| row.id).max().unwrap_or(0) + 1;
            partition.insert(definition.name.clone(), TableRow::from_definition(&definition));
            store.save(&partitions)?;
            Ok(definition)
        })
        .await
        .map_err(map_join_error)??;

        info!(name = %stored.name, id = stored.id, "feature bit added");
        Ok(stored)
    }

    async fn update(&self, definition: FeatureBitDefinition) -> DomainResult<()> {
        definition.validate()?;
        let store = Arc::clone(&self.store);
        let name = definition.name.clone();

        task::spawn_blocking(move || -> DomainResult<()> {
            let mut partitions = store.load()?;
            let partition = partitions.entry(FEATURE_BITS_TABLE.to_string()).or_default();

            let row = partition.get_mut(&definition.name).ok_or_else(|| {
                FlagbitError::NotFound(format!(
                    "feature bit '{}' could not be found",
                    definition.name
                ))
            })?;

            // Mutable fields only; identity and creation audit stay as
            // stored. Writing always normalises to name-based dependencies.
            row.on_off = definition.on_off;
            row.excluded_environments = definition.excluded_environments.clone();
            row.included_environments = definition.included_environments.clone();
            row.minimum_allowed_permission_level = definition.minimum_allowed_permission_level;
            row.exact_allowed_permission_level = definition.exact_allowed_permission_level;
            row.allowed_users = definition.allowed_users.clone();
            row.dependencies = definition.dependencies.clone();
            row.dependent_ids = None;
            row.last_modified_date_time = definition.last_modified_date_time;
            row.last_modified_by_user = definition.last_modified_by_user.clone();

            store.save(&partitions)
        })
        .await
        .map_err(map_join_error)??;

        info!(name = %name, "feature bit updated");
        Ok(())
    }

    async fn remove(&self, definition: &FeatureBitDefinition) -> DomainResult<()> {
        let store = Arc::clone(&self.store);
        let name = definition.name.clone();

        task::spawn_blocking(move || -> DomainResult<()> {
            let mut partitions = store.load()?;
            if let Some(partition) = partitions.get_mut(FEATURE_BITS_TABLE) {
                if partition.remove(&name).is_some() {
                    store.save(&partitions)?;
                }
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)??;

        info!(name = %definition.name, "feature bit removed");
        Ok(())
    }
}

fn load_partition(store: &JsonTableStore) -> DomainResult<Partition> {
    Ok(store.load()?.remove(FEATURE_BITS_TABLE).unwrap_or_default())
}

/// Map JoinError from spawn_blocking to FlagbitError.
fn map_join_error(err: task::JoinError) -> FlagbitError {
    if err.is_cancelled() {
        FlagbitError::Internal("blocking task cancelled".into())
    } else {
        FlagbitError::Internal(format!("blocking task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::TempDir;

    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn add_assigns_next_id_per_partition() {
        let (repo, _dir) = setup();

        let first = repo.add(definition("first")).await.expect("first added");
        let second = repo.add(definition("second")).await.expect("second added");

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn add_rejects_duplicate_row_keys() {
        let (repo, _dir) = setup();

        repo.add(definition("duplicate")).await.expect("first added");
        let err = repo.add(definition("duplicate")).await.expect_err("row key taken");
        assert!(matches!(err, FlagbitError::Conflict(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn get_all_returns_definitions_ordered_by_id() {
        let (repo, _dir) = setup();

        repo.add(definition("zulu")).await.expect("added");
        repo.add(definition("alpha")).await.expect("added");

        let all = repo.get_all().await.expect("query succeeded");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "zulu");
        assert_eq!(all[1].name, "alpha");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn update_of_missing_row_is_not_found() {
        let (repo, _dir) = setup();
        let err = repo.update(definition("ghost")).await.expect_err("row missing");
        assert!(matches!(err, FlagbitError::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn update_clears_legacy_dependent_ids() {
        let (repo, store, _dir) = setup_with_store();

        let base = repo.add(definition("base")).await.expect("added");
        let mut legacy_row = TableRow::from_definition(&repo
            .add(definition("legacy"))
            .await
            .expect("added"));
        legacy_row.dependencies = None;
        legacy_row.dependent_ids = Some(base.id.to_string());

        // Rewrite the stored row into its legacy shape.
        let mut partitions = store.load().expect("load succeeds");
        partitions
            .get_mut(FEATURE_BITS_TABLE)
            .expect("partition exists")
            .insert("legacy".into(), legacy_row);
        store.save(&partitions).expect("save succeeds");

        // Reads translate ids to names.
        let fetched = repo
            .get_by_name("legacy")
            .await
            .expect("query succeeded")
            .expect("row found");
        assert_eq!(fetched.dependencies.as_deref(), Some("base"));

        // An update persists the canonical form and drops the legacy column.
        repo.update(fetched).await.expect("updated");
        let partitions = store.load().expect("load succeeds");
        let row = partitions
            .get(FEATURE_BITS_TABLE)
            .expect("partition exists")
            .get("legacy")
            .expect("row exists");
        assert_eq!(row.dependencies.as_deref(), Some("base"));
        assert!(row.dependent_ids.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn remove_is_tolerant_of_missing_rows() {
        let (repo, _dir) = setup();
        repo.remove(&definition("ghost")).await.expect("remove of missing row is a no-op");
    }

    fn definition(name: &str) -> FeatureBitDefinition {
        let now = Utc::now();
        FeatureBitDefinition {
            id: 0,
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

    fn setup() -> (TableFeatureBitRepository, TempDir) {
        let (repo, _store, dir) = setup_with_store();
        (repo, dir)
    }

    /// Set up a repository and direct store access over a fresh file.
    fn setup_with_store() -> (TableFeatureBitRepository, Arc<JsonTableStore>, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir created");
        let store = Arc::new(JsonTableStore::new(temp_dir.path().join("bits.json")));
        (TableFeatureBitRepository::new(Arc::clone(&store)), store, temp_dir)
    }
}
