//! Feature bit entity types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_ALLOWED_USERS_LEN, MAX_ENVIRONMENTS_LEN, MAX_NAME_LEN, MAX_USER_LEN};
use crate::errors::{FlagbitError, Result};

/// One named feature flag and its enablement rules.
///
/// `name` is the primary external identifier: it is unique per store, used
/// on the command line and inside other definitions' `dependencies` lists.
/// `id` is assigned by the store on creation (max existing + 1) and is the
/// key the evaluator resolves at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureBitDefinition {
    /// Store-assigned unique id.
    pub id: i32,
    /// Unique, case-sensitive name.
    pub name: String,
    /// Baseline state when no other rule applies. Defaults to off.
    pub on_off: bool,
    /// Comma-separated environments in which the feature is forced OFF.
    pub excluded_environments: Option<String>,
    /// Comma-separated environments; when set, the feature is enabled only
    /// in one of these environments (overrides `on_off`).
    pub included_environments: Option<String>,
    /// Minimum caller permission level; 0 disables the rule.
    pub minimum_allowed_permission_level: i32,
    /// Exact caller permission level; takes precedence over the minimum.
    pub exact_allowed_permission_level: Option<i32>,
    /// Comma-separated allow-list of users. Stored, not evaluated.
    pub allowed_users: Option<String>,
    /// Comma-separated names of feature bits that must all be enabled.
    pub dependencies: Option<String>,
    pub created_date_time: DateTime<Utc>,
    pub created_by_user: String,
    pub last_modified_date_time: DateTime<Utc>,
    pub last_modified_by_user: String,
}

impl FeatureBitDefinition {
    /// Validate required fields and length limits.
    ///
    /// Collects every violation into one `Validation` error so a caller
    /// sees the full list at once rather than fixing fields one by one.
    pub fn validate(&self) -> Result<()> {
        let mut problems: Vec<String> = Vec::new();

        if self.name.trim().is_empty() {
            problems.push("the Name field is required".into());
        } else if self.name.len() > MAX_NAME_LEN {
            problems.push(format!("the Name field must not exceed {MAX_NAME_LEN} characters"));
        }

        if let Some(envs) = &self.excluded_environments {
            if envs.len() > MAX_ENVIRONMENTS_LEN {
                problems.push(format!(
                    "the ExcludedEnvironments field must not exceed {MAX_ENVIRONMENTS_LEN} characters"
                ));
            }
        }

        if let Some(users) = &self.allowed_users {
            if users.len() > MAX_ALLOWED_USERS_LEN {
                problems.push(format!(
                    "the AllowedUsers field must not exceed {MAX_ALLOWED_USERS_LEN} characters"
                ));
            }
        }

        if self.minimum_allowed_permission_level < 0 {
            problems.push("the MinimumAllowedPermissionLevel field must not be negative".into());
        }

        for (field, value) in
            [("CreatedByUser", &self.created_by_user), ("LastModifiedByUser", &self.last_modified_by_user)]
        {
            if value.trim().is_empty() {
                problems.push(format!("the {field} field is required"));
            } else if value.len() > MAX_USER_LEN {
                problems.push(format!("the {field} field must not exceed {MAX_USER_LEN} characters"));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(FlagbitError::Validation(problems.join("; ")))
        }
    }

    /// Overwrite the mutable fields from `incoming`, preserving identity
    /// and creation audit fields and refreshing the last-modified pair.
    pub fn apply_update(&mut self, incoming: &FeatureBitDefinition) {
        self.on_off = incoming.on_off;
        self.excluded_environments = incoming.excluded_environments.clone();
        self.included_environments = incoming.included_environments.clone();
        self.minimum_allowed_permission_level = incoming.minimum_allowed_permission_level;
        self.exact_allowed_permission_level = incoming.exact_allowed_permission_level;
        self.allowed_users = incoming.allowed_users.clone();
        self.dependencies = incoming.dependencies.clone();
        self.last_modified_date_time = incoming.last_modified_date_time;
        self.last_modified_by_user = incoming.last_modified_by_user.clone();
    }
}
