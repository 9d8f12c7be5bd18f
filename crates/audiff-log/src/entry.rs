use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use audiff_types::{records_from_json, records_to_json, DiffRecord};

use crate::error::AuditResult;

/// The kind of change an audit entry describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// One persisted audit-log entry.
///
/// `detail` is the opaque JSON payload: for updates, the array of diff
/// records in emission order; for creates and deletes, an empty array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// UUID v7, so ids sort by creation time.
    pub id: Uuid,
    pub model: String,
    pub resource_id: String,
    pub action: Action,
    pub actor: String,
    pub detail: String,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Create an entry stamped with a fresh id and the current time.
    pub fn new(
        model: impl Into<String>,
        resource_id: impl Into<String>,
        action: Action,
        actor: impl Into<String>,
        records: &[DiffRecord],
    ) -> AuditResult<Self> {
        Ok(Self {
            id: Uuid::now_v7(),
            model: model.into(),
            resource_id: resource_id.into(),
            action,
            actor: actor.into(),
            detail: records_to_json(records)?,
            recorded_at: Utc::now(),
        })
    }

    /// Parse the detail payload back into records.
    pub fn records(&self) -> AuditResult<Vec<DiffRecord>> {
        Ok(records_from_json(&self.detail)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_is_the_serialized_record_array() {
        let records = vec![
            DiffRecord::new("Title", "test", "test1"),
            DiffRecord::new("Content", "", "124"),
        ];
        let entry = AuditEntry::new("Post", "1", Action::Update, "alice", &records).unwrap();
        assert_eq!(
            entry.detail,
            r#"[{"Field":"Title","Old":"test","New":"test1"},{"Field":"Content","Old":"","New":"124"}]"#
        );
        assert_eq!(entry.records().unwrap(), records);
    }

    #[test]
    fn ids_are_unique() {
        let a = AuditEntry::new("Post", "1", Action::Create, "alice", &[]).unwrap();
        let b = AuditEntry::new("Post", "1", Action::Delete, "alice", &[]).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.get_version_num(), 7);
        assert_eq!(a.detail, "[]");
    }

    #[test]
    fn action_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Action::Update).unwrap(), r#""update""#);
        assert_eq!(Action::Delete.to_string(), "delete");
    }
}
