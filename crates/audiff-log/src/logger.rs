use serde::Serialize;
use tracing::{debug, info, warn};

use crate::entry::{Action, AuditEntry};
use crate::error::AuditResult;
use crate::registry::FrozenRegistry;
use crate::traits::{AuditLogReader, AuditLogWriter};

/// Records model changes into an audit log.
///
/// Each model is diffed with the engine it was registered with. An update
/// writes an entry only when the diff succeeds and reports at least one
/// change; a failed diff aborts the write and surfaces the error.
pub struct AuditLogger<W> {
    registry: FrozenRegistry,
    writer: W,
}

impl<W: AuditLogWriter> AuditLogger<W> {
    pub fn new(registry: FrozenRegistry, writer: W) -> Self {
        Self { registry, writer }
    }

    pub fn registry(&self) -> &FrozenRegistry {
        &self.registry
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Diff `old` against `new` and append an update entry if anything changed.
    ///
    /// Returns `Ok(None)` when the diff is empty.
    pub fn log_update<T>(
        &self,
        model: &str,
        resource_id: &str,
        actor: &str,
        old: &T,
        new: &T,
    ) -> AuditResult<Option<AuditEntry>>
    where
        T: ?Sized + Serialize,
    {
        let engine = self.registry.engine(model)?;
        let records = engine.diff(old, new).inspect_err(|err| {
            warn!(model, resource_id, error = %err, "diff failed, audit entry not written");
        })?;

        if records.is_empty() {
            debug!(model, resource_id, "no auditable changes");
            return Ok(None);
        }

        let entry = AuditEntry::new(model, resource_id, Action::Update, actor, &records)?;
        let stored = self.writer.append(entry)?;
        info!(id = %stored.id, model, resource_id, records = records.len(), "update audited");
        Ok(Some(stored))
    }

    /// Append a create entry with an empty detail.
    pub fn log_create(
        &self,
        model: &str,
        resource_id: &str,
        actor: &str,
    ) -> AuditResult<AuditEntry> {
        self.log_action(model, resource_id, actor, Action::Create)
    }

    /// Append a delete entry with an empty detail.
    pub fn log_delete(
        &self,
        model: &str,
        resource_id: &str,
        actor: &str,
    ) -> AuditResult<AuditEntry> {
        self.log_action(model, resource_id, actor, Action::Delete)
    }

    fn log_action(
        &self,
        model: &str,
        resource_id: &str,
        actor: &str,
        action: Action,
    ) -> AuditResult<AuditEntry> {
        self.registry.engine(model)?;
        let entry = AuditEntry::new(model, resource_id, action, actor, &[])?;
        let stored = self.writer.append(entry)?;
        info!(id = %stored.id, model, resource_id, action = %action, "action audited");
        Ok(stored)
    }
}

impl<W: AuditLogWriter + AuditLogReader> AuditLogger<W> {
    /// Entries recorded for one resource, oldest first.
    pub fn history(&self, model: &str, resource_id: &str) -> AuditResult<Vec<AuditEntry>> {
        self.registry.engine(model)?;
        self.writer.entries_for(model, resource_id)
    }
}
