//! Stored record shapes shared by every backend.

use std::time::SystemTime;

use pchat::ChatLogEntry;

/// One audit entry as read back from a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub id: i64,
    pub created_at: SystemTime,
    pub entry: ChatLogEntry,
}
