//! SQLite-backed feature bit repository.
//!
//! Implements the `FeatureBitRepository` port against the pooled rusqlite
//! connection. All database operations run in `spawn_blocking` to avoid
//! blocking the async runtime.
//!
//! The add path is check-then-act: name existence is verified with one
//! query and the insert follows with another, with no transaction spanning
//! both. A concurrent writer can slip between the two; the unique index on
//! `name` then surfaces the race as a store error.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flagbit_core::ports::FeatureBitRepository;
use flagbit_domain::{FeatureBitDefinition, FlagbitError, Result as DomainResult};
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;
use tracing::info;

use super::manager::{DbManager, PooledConnection};

/// SQLite-backed feature bit repository.
pub struct SqliteFeatureBitRepository {
    db: Arc<DbManager>,
}

impl SqliteFeatureBitRepository {
    /// Create a new repository with the given database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FeatureBitRepository for SqliteFeatureBitRepository {
    async fn get_all(&self) -> DomainResult<Vec<FeatureBitDefinition>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Vec<FeatureBitDefinition>> {
            let conn = db.get_connection()?;
            query_all(&conn)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get_by_name(&self, name: &str) -> DomainResult<Option<FeatureBitDefinition>> {
        let db = Arc::clone(&self.db);
        let name = name.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<FeatureBitDefinition>> {
            let conn = db.get_connection()?;
            query_by_name(&conn, &name)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn add(&self, definition: FeatureBitDefinition) -> DomainResult<FeatureBitDefinition> {
        definition.validate()?;
        let db = Arc::clone(&self.db);

        let stored = task::spawn_blocking(move || -> DomainResult<FeatureBitDefinition> {
            let conn = db.get_connection()?;
            insert_definition(&conn, definition)
        })
        .await
        .map_err(map_join_error)??;

        info!(name = %stored.name, id = stored.id, "feature bit added");
        Ok(stored)
    }

    async fn update(&self, definition: FeatureBitDefinition) -> DomainResult<()> {
        definition.validate()?;
        let db = Arc::clone(&self.db);
        let name = definition.name.clone();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            update_definition(&conn, &definition)
        })
        .await
        .map_err(map_join_error)??;

        info!(name = %name, "feature bit updated");
        Ok(())
    }

    async fn remove(&self, definition: &FeatureBitDefinition) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let name = definition.name.clone();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute("DELETE FROM feature_bits WHERE name = ?1", params![name])
                .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)??;

        info!(name = %definition.name, "feature bit removed");
        Ok(())
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

const SELECT_COLUMNS: &str = "id, name, on_off, excluded_environments, included_environments, \
     minimum_allowed_permission_level, exact_allowed_permission_level, allowed_users, \
     dependencies, created_date_time, created_by_user, last_modified_date_time, \
     last_modified_by_user";

fn query_all(conn: &PooledConnection) -> DomainResult<Vec<FeatureBitDefinition>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {SELECT_COLUMNS} FROM feature_bits ORDER BY id"))
        .map_err(map_sql_error)?;

    let rows = stmt.query_map([], row_to_definition).map_err(map_sql_error)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
}

fn query_by_name(conn: &PooledConnection, name: &str) -> DomainResult<Option<FeatureBitDefinition>> {
    conn.query_row(
        &format!("SELECT {SELECT_COLUMNS} FROM feature_bits WHERE name = ?1"),
        params![name],
        row_to_definition,
    )
    .optional()
    .map_err(map_sql_error)
}

/// Existence check, next-id assignment and insert.
fn insert_definition(
    conn: &PooledConnection,
    mut definition: FeatureBitDefinition,
) -> DomainResult<FeatureBitDefinition> {
    let exists: Option<i32> = conn
        .query_row(
            "SELECT 1 FROM feature_bits WHERE name = ?1",
            params![definition.name],
            |row| row.get(0),
        )
        .optional()
        .map_err(map_sql_error)?;
    if exists.is_some() {
        return Err(FlagbitError::Conflict(format!(
            "cannot add, feature bit with name '{}' already exists",
            definition.name
        )));
    }

    let next_id: i32 = conn
        .query_row("SELECT COALESCE(MAX(id), 0) + 1 FROM feature_bits", [], |row| row.get(0))
        .map_err(map_sql_error)?;
    definition.id = next_id;

    conn.execute(
        "INSERT INTO feature_bits (id, name, on_off, excluded_environments, \
         included_environments, minimum_allowed_permission_level, \
         exact_allowed_permission_level, allowed_users, dependencies, created_date_time, \
         created_by_user, last_modified_date_time, last_modified_by_user) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            definition.id,
            definition.name,
            definition.on_off as i64,
            definition.excluded_environments,
            definition.included_environments,
            definition.minimum_allowed_permission_level,
            definition.exact_allowed_permission_level,
            definition.allowed_users,
            definition.dependencies,
            definition.created_date_time.timestamp(),
            definition.created_by_user,
            definition.last_modified_date_time.timestamp(),
            definition.last_modified_by_user,
        ],
    )
    .map_err(map_sql_error)?;

    Ok(definition)
}

/// Overwrite the mutable fields of a stored definition, matched by name.
/// Identity and creation audit columns are never touched.
fn update_definition(conn: &PooledConnection, definition: &FeatureBitDefinition) -> DomainResult<()> {
    let affected = conn
        .execute(
            "UPDATE feature_bits SET on_off = ?1, excluded_environments = ?2, \
             included_environments = ?3, minimum_allowed_permission_level = ?4, \
             exact_allowed_permission_level = ?5, allowed_users = ?6, dependencies = ?7, \
             last_modified_date_time = ?8, last_modified_by_user = ?9 \
             WHERE name = ?10",
            params![
                definition.on_off as i64,
                definition.excluded_environments,
                definition.included_environments,
                definition.minimum_allowed_permission_level,
                definition.exact_allowed_permission_level,
                definition.allowed_users,
                definition.dependencies,
                definition.last_modified_date_time.timestamp(),
                definition.last_modified_by_user,
                definition.name,
            ],
        )
        .map_err(map_sql_error)?;

    if affected == 0 {
        return Err(FlagbitError::NotFound(format!(
            "feature bit '{}' could not be found",
            definition.name
        )));
    }
    Ok(())
}

fn row_to_definition(row: &Row<'_>) -> rusqlite::Result<FeatureBitDefinition> {
    Ok(FeatureBitDefinition {
        id: row.get(0)?,
        name: row.get(1)?,
        on_off: row.get::<_, i64>(2)? != 0,
        excluded_environments: row.get(3)?,
        included_environments: row.get(4)?,
        minimum_allowed_permission_level: row.get(5)?,
        exact_allowed_permission_level: row.get(6)?,
        allowed_users: row.get(7)?,
        dependencies: row.get(8)?,
        created_date_time: epoch_to_datetime(9, row.get(9)?)?,
        created_by_user: row.get(10)?,
        last_modified_date_time: epoch_to_datetime(11, row.get(11)?)?,
        last_modified_by_user: row.get(12)?,
    })
}

fn epoch_to_datetime(column: usize, secs: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(column, secs))
}

// ============================================================================
// Error Mapping
// ============================================================================

fn map_sql_error(err: rusqlite::Error) -> FlagbitError {
    FlagbitError::Store(err.to_string())
}

/// Map JoinError from spawn_blocking to FlagbitError.
fn map_join_error(err: task::JoinError) -> FlagbitError {
    if err.is_cancelled() {
        FlagbitError::Internal("blocking task cancelled".into())
    } else {
        FlagbitError::Internal(format!("blocking task failed: {err}"))
    }
}

// ============================================================================
// Tests
// ============================================================================
