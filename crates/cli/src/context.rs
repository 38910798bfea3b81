//! Ambient inputs made explicit.
//!
//! The commands need "who is running this" and "when" for the audit
//! fields. Both are captured once at startup and injected, so tests can
//! pin them instead of patching process-wide state.

use chrono::{DateTime, Utc};

/// Identity and clock snapshot for one CLI invocation.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub username: String,
    pub timestamp: DateTime<Utc>,
}

impl CommandContext {
    /// Create a context with explicit values.
    pub fn new(username: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self { username: username.into(), timestamp }
    }

    /// Capture the invoking user (USERNAME, then USER) and the current
    /// time.
    pub fn from_env() -> Self {
        let username = std::env::var("USERNAME")
            .or_else(|_| std::env::var("USER"))
            .unwrap_or_else(|_| "unknown".to_string());
        Self::new(username, Utc::now())
    }
}
