//! Field path construction.
//!
//! A field path locates a value inside a nested structure by joining struct
//! field names, sequence indices, and mapping keys with dots:
//!
//! - `Title`: a top-level field
//! - `Comments.0.Text`: field `Text` of the first element of `Comments`
//! - `Tags.t2`: key `t2` of the mapping `Tags`

use std::fmt;

use serde::{Deserialize, Serialize};

/// Join a path prefix and a suffix with a dot.
///
/// An empty prefix yields the suffix and an empty suffix yields the prefix,
/// so callers never produce leading, trailing, or doubled dots.
///
/// # Examples
///
/// ```
/// use audiff_types::format_field_by_dot;
///
/// assert_eq!(format_field_by_dot("", "Title"), "Title");
/// assert_eq!(format_field_by_dot("Comments", "0"), "Comments.0");
/// assert_eq!(format_field_by_dot("Comments.0", ""), "Comments.0");
/// ```
pub fn format_field_by_dot(prefix: &str, suffix: &str) -> String {
    if prefix.is_empty() {
        return suffix.to_string();
    }
    if suffix.is_empty() {
        return prefix.to_string();
    }
    format!("{prefix}.{suffix}")
}

/// An owned field path, extended one segment at a time during traversal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    /// The empty path (the value being diffed itself).
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns `true` for the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path of a named struct field or a rendered mapping key below this one.
    pub fn child(&self, segment: &str) -> Self {
        Self(format_field_by_dot(&self.0, segment))
    }

    /// Path of a sequence element below this one.
    pub fn index(&self, index: usize) -> Self {
        self.child(&index.to_string())
    }

    /// The path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Dot-separated segments of the path. The root path has none.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|s| !s.is_empty())
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }
}

impl From<&str> for FieldPath {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<FieldPath> for String {
    fn from(value: FieldPath) -> Self {
        value.0
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
