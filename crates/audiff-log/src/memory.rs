use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;
use uuid::Uuid;

use crate::entry::AuditEntry;
use crate::error::{AuditError, AuditResult};
use crate::traits::{AuditLogReader, AuditLogWriter};

/// In-memory audit log for tests, local demos, and embedding.
#[derive(Default)]
pub struct InMemoryAuditLog {
    inner: RwLock<LogState>,
}

#[derive(Default)]
struct LogState {
    entries: Vec<AuditEntry>,
    id_index: HashMap<Uuid, usize>,
    resource_index: HashMap<(String, String), Vec<usize>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> AuditResult<RwLockReadGuard<'_, LogState>> {
        self.inner
            .read()
            .map_err(|_| AuditError::Store("audit log read lock poisoned".into()))
    }

    fn write_state(&self) -> AuditResult<RwLockWriteGuard<'_, LogState>> {
        self.inner
            .write()
            .map_err(|_| AuditError::Store("audit log write lock poisoned".into()))
    }
}

impl AuditLogWriter for InMemoryAuditLog {
    fn append(&self, entry: AuditEntry) -> AuditResult<AuditEntry> {
        let mut state = self.write_state()?;
        if state.id_index.contains_key(&entry.id) {
            return Err(AuditError::DuplicateEntry(entry.id));
        }

        let position = state.entries.len();
        state.id_index.insert(entry.id, position);
        state
            .resource_index
            .entry((entry.model.clone(), entry.resource_id.clone()))
            .or_default()
            .push(position);
        state.entries.push(entry.clone());

        debug!(
            id = %entry.id,
            model = %entry.model,
            action = %entry.action,
            "audit entry appended"
        );
        Ok(entry)
    }
}

impl AuditLogReader for InMemoryAuditLog {
    fn entries_for(&self, model: &str, resource_id: &str) -> AuditResult<Vec<AuditEntry>> {
        let state = self.read_state()?;
        let Some(positions) = state
            .resource_index
            .get(&(model.to_string(), resource_id.to_string()))
        else {
            return Ok(vec![]);
        };
        Ok(positions
            .iter()
            .filter_map(|&i| state.entries.get(i))
            .cloned()
            .collect())
    }

    fn all(&self) -> AuditResult<Vec<AuditEntry>> {
        Ok(self.read_state()?.entries.clone())
    }

    fn get(&self, id: &Uuid) -> AuditResult<Option<AuditEntry>> {
        let state = self.read_state()?;
        Ok(state
            .id_index
            .get(id)
            .and_then(|&i| state.entries.get(i))
            .cloned())
    }

    fn len(&self) -> AuditResult<usize> {
        Ok(self.read_state()?.entries.len())
    }
}
