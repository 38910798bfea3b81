//! JSON file store with table-storage row layout.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flagbit_core::{join_names, split_ids, split_names};
use flagbit_domain::{
    FeatureBitDefinition, FlagbitError, Result, FEATURE_BITS_TABLE,
};
use serde::{Deserialize, Serialize};

/// Rows of one partition, keyed by row key.
pub type Partition = BTreeMap<String, TableRow>;

/// All partitions of the store, keyed by partition key.
pub type Partitions = BTreeMap<String, Partition>;

/// One stored table row.
///
/// Field names follow the table-storage convention (PascalCase, explicit
/// `PartitionKey`/`RowKey`) so existing exports load unchanged. The legacy
/// `DependentIds` column is accepted on read and never written back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableRow {
    pub partition_key: String,
    pub row_key: String,
    pub id: i32,
    pub name: String,
    pub on_off: bool,
    #[serde(default)]
    pub excluded_environments: Option<String>,
    #[serde(default)]
    pub included_environments: Option<String>,
    #[serde(default)]
    pub minimum_allowed_permission_level: i32,
    #[serde(default)]
    pub exact_allowed_permission_level: Option<i32>,
    #[serde(default)]
    pub allowed_users: Option<String>,
    #[serde(default)]
    pub dependencies: Option<String>,
    /// Legacy id-keyed dependency list. Translated to names on read.
    #[serde(default)]
    pub dependent_ids: Option<String>,
    pub created_date_time: DateTime<Utc>,
    pub created_by_user: String,
    pub last_modified_date_time: DateTime<Utc>,
    pub last_modified_by_user: String,
}

impl TableRow {
    /// Build a row from a definition, always in the canonical name-based
    /// dependency representation.
    pub fn from_definition(definition: &FeatureBitDefinition) -> Self {
        Self {
            partition_key: FEATURE_BITS_TABLE.to_string(),
            row_key: definition.name.clone(),
            id: definition.id,
            name: definition.name.clone(),
            on_off: definition.on_off,
            excluded_environments: definition.excluded_environments.clone(),
            included_environments: definition.included_environments.clone(),
            minimum_allowed_permission_level: definition.minimum_allowed_permission_level,
            exact_allowed_permission_level: definition.exact_allowed_permission_level,
            allowed_users: definition.allowed_users.clone(),
            dependencies: definition.dependencies.clone(),
            dependent_ids: None,
            created_date_time: definition.created_date_time,
            created_by_user: definition.created_by_user.clone(),
            last_modified_date_time: definition.last_modified_date_time,
            last_modified_by_user: definition.last_modified_by_user.clone(),
        }
    }

    /// Convert a stored row back to the domain entity.
    ///
    /// A legacy row whose `DependentIds` is set while `Dependencies` is
    /// empty has its ids resolved to names against the partition snapshot.
    /// A malformed id token is a `Format` error; an id no row carries is a
    /// `Validation` error.
    pub fn to_definition(&self, partition: &Partition) -> Result<FeatureBitDefinition> {
        let dependencies = self.canonical_dependencies(partition)?;
        Ok(FeatureBitDefinition {
            id: self.id,
            name: self.name.clone(),
            on_off: self.on_off,
            excluded_environments: self.excluded_environments.clone(),
            included_environments: self.included_environments.clone(),
            minimum_allowed_permission_level: self.minimum_allowed_permission_level,
            exact_allowed_permission_level: self.exact_allowed_permission_level,
            allowed_users: self.allowed_users.clone(),
            dependencies,
            created_date_time: self.created_date_time,
            created_by_user: self.created_by_user.clone(),
            last_modified_date_time: self.last_modified_date_time,
            last_modified_by_user: self.last_modified_by_user.clone(),
        })
    }

    fn canonical_dependencies(&self, partition: &Partition) -> Result<Option<String>> {
        if !split_names(self.dependencies.as_deref()).is_empty() {
            return Ok(self.dependencies.clone());
        }

        let ids = split_ids(self.dependent_ids.as_deref())?;
        if ids.is_empty() {
            return Ok(None);
        }

        let names = ids
            .iter()
            .map(|id| {
                partition
                    .values()
                    .find(|row| row.id == *id)
                    .map(|row| row.name.clone())
                    .ok_or_else(|| {
                        FlagbitError::Validation(format!(
                            "row '{}' references unknown dependency id {id}",
                            self.row_key
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(join_names(&names)))
    }
}

/// JSON file holding all partitions.
///
/// The file is created lazily on first write; loading a missing file yields
/// an empty store. All methods are synchronous; the repository wraps them in
/// `spawn_blocking`.
pub struct JsonTableStore {
    path: PathBuf,
}

impl JsonTableStore {
    /// Create a store over the given file path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    /// Return the configured store path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every partition from disk.
    pub fn load(&self) -> Result<Partitions> {
        if !self.path.exists() {
            return Ok(Partitions::new());
        }
        let text = fs::read_to_string(&self.path)
            .map_err(|e| FlagbitError::Store(format!("failed to read table store: {e}")))?;
        serde_json::from_str(&text)
            .map_err(|e| FlagbitError::Store(format!("failed to parse table store: {e}")))
    }

    /// Persist every partition to disk, creating parent directories as
    /// needed.
    pub fn save(&self, partitions: &Partitions) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| FlagbitError::Store(format!("failed to create store dir: {e}")))?;
        }
        let text = serde_json::to_string_pretty(partitions)
            .map_err(|e| FlagbitError::Store(format!("failed to serialize table store: {e}")))?;
        fs::write(&self.path, text)
            .map_err(|e| FlagbitError::Store(format!("failed to write table store: {e}")))
    }
}
