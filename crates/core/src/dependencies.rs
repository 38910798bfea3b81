//! Dependency-list codec.
//!
//! A definition's `dependencies` column is a comma-separated list of other
//! feature bit names (or, in legacy table-storage rows, numeric ids). These
//! helpers are the single place the textual form is parsed or produced, so
//! the trimming and empty-token rules stay consistent between the evaluator,
//! the write-path validation, and the storage adapters.

use flagbit_domain::{FlagbitError, Result};

/// Split a comma-separated dependency list into trimmed, non-empty names.
///
/// `None` and blank input produce an empty list. Order is preserved and
/// duplicates are kept; callers that care about duplicates handle them.
pub fn split_names(text: Option<&str>) -> Vec<String> {
    match text {
        None => Vec::new(),
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(ToString::to_string)
            .collect(),
    }
}

/// Split a legacy comma-separated id list into integers.
///
/// Same splitting rules as [`split_names`]; any token that is not a valid
/// integer is a [`FlagbitError::Format`] error. Only the legacy id-keyed
/// table-storage rows use this form.
pub fn split_ids(text: Option<&str>) -> Result<Vec<i32>> {
    split_names(text)
        .into_iter()
        .map(|token| {
            token
                .parse::<i32>()
                .map_err(|_| FlagbitError::Format(format!("invalid dependency id '{token}'")))
        })
        .collect()
}

/// Join dependency names back into the stored comma-separated form.
pub fn join_names<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| name.as_ref().trim().to_string())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}
