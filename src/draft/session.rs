// Draft session identifiers.
//
// All pick state is scoped to a session id so the store and engine can be
// reused across drafts without any global "current draft" assumption.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one draft's worth of pick state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DraftSessionId(String);

impl DraftSessionId {
    pub fn new(id: impl Into<String>) -> Self {
        DraftSessionId(id.into())
    }

    /// Generate a new session id from the current UTC timestamp.
    ///
    /// Format: `session_YYYYMMDD_HHMMSS_SSS`. The millisecond suffix keeps
    /// ids unique even if two sessions start in the same second.
    pub fn generate() -> Self {
        let now = chrono::Utc::now();
        DraftSessionId(now.format("session_%Y%m%d_%H%M%S_%3f").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DraftSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
