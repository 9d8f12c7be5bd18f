use uuid::Uuid;

use crate::entry::AuditEntry;
use crate::error::AuditResult;

/// Write boundary for audit-log storage.
pub trait AuditLogWriter: Send + Sync {
    /// Persist `entry` and return the stored copy.
    fn append(&self, entry: AuditEntry) -> AuditResult<AuditEntry>;
}

/// Read boundary for audit-log queries.
pub trait AuditLogReader: Send + Sync {
    /// Entries for one resource of one model, oldest first.
    fn entries_for(&self, model: &str, resource_id: &str) -> AuditResult<Vec<AuditEntry>>;

    /// Every entry, oldest first.
    fn all(&self) -> AuditResult<Vec<AuditEntry>>;

    fn get(&self, id: &Uuid) -> AuditResult<Option<AuditEntry>>;

    fn len(&self) -> AuditResult<usize>;

    fn is_empty(&self) -> AuditResult<bool> {
        Ok(self.len()? == 0)
    }
}
