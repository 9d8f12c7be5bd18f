use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// One field-level change between an old and a new value.
///
/// Both sides are string renderings. An empty string on one side means the
/// value was absent there (an element appended to a sequence, a key removed
/// from a mapping, an optional that became populated, and so on).
///
/// Serialized as `{"Field": .., "Old": .., "New": ..}`, which is the shape
/// persisted in audit-log detail payloads.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiffRecord {
    /// Dotted/indexed locator of the changed value, e.g. `Comments.0.Text`.
    #[serde(rename = "Field")]
    pub field_path: String,
    /// Rendering of the old value.
    #[serde(rename = "Old")]
    pub old_value: String,
    /// Rendering of the new value.
    #[serde(rename = "New")]
    pub new_value: String,
}

impl DiffRecord {
    /// Create a record with explicit renderings on both sides.
    pub fn new(
        field_path: impl Into<String>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Self {
        Self {
            field_path: field_path.into(),
            old_value: old_value.into(),
            new_value: new_value.into(),
        }
    }

    /// A value that only exists on the new side.
    pub fn added(field_path: impl Into<String>, new_value: impl Into<String>) -> Self {
        Self::new(field_path, String::new(), new_value)
    }

    /// A value that only exists on the old side.
    pub fn removed(field_path: impl Into<String>, old_value: impl Into<String>) -> Self {
        Self::new(field_path, old_value, String::new())
    }

    /// Returns `true` if the old side is empty and the new side is not.
    pub fn is_addition(&self) -> bool {
        self.old_value.is_empty() && !self.new_value.is_empty()
    }

    /// Returns `true` if the new side is empty and the old side is not.
    pub fn is_removal(&self) -> bool {
        self.new_value.is_empty() && !self.old_value.is_empty()
    }
}

impl fmt::Display for DiffRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:?} -> {:?}",
            self.field_path, self.old_value, self.new_value
        )
    }
}

/// Serialize records as a JSON array, preserving order.
pub fn records_to_json(records: &[DiffRecord]) -> Result<String, TypeError> {
    serde_json::to_string(records).map_err(|e| TypeError::Serialization(e.to_string()))
}

/// Parse a JSON array of records.
pub fn records_from_json(json: &str) -> Result<Vec<DiffRecord>, TypeError> {
    serde_json::from_str(json).map_err(|e| TypeError::Serialization(e.to_string()))
}
