//! Domain constants shared by validation and the storage layer.

/// Maximum length of a feature bit name.
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length of the created-by / last-modified-by user fields.
pub const MAX_USER_LEN: usize = 100;

/// Maximum length of the excluded-environments list.
pub const MAX_ENVIRONMENTS_LEN: usize = 300;

/// Maximum length of the allowed-users list.
pub const MAX_ALLOWED_USERS_LEN: usize = 2048;

/// Fixed partition (table) name used by the table-storage backend.
pub const FEATURE_BITS_TABLE: &str = "FeatureBits";
