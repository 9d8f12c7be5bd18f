//! Field-name ignore rules.
//!
//! A field is ignored when its name matches the baseline (identity key,
//! creation/update timestamps, soft-delete marker) or the configured
//! extension. Matching is by bare name at any nesting depth: a nested
//! struct's `id` is suppressed just like the top-level one.
//!
//! Names are normalised before comparison (ASCII-lowercased, underscores
//! removed) so `CreatedAt` and `created_at` are the same rule.

use std::collections::HashSet;

/// Field names that are never audited.
pub const BASELINE_IGNORED: [&str; 4] = ["ID", "CreatedAt", "UpdatedAt", "DeletedAt"];

/// Baseline plus a configurable extension of ignored field names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    /// Extension names in insertion order, de-duplicated after normalising.
    extra: Vec<String>,
    normalized: HashSet<String>,
}

impl IgnoreSet {
    /// An ignore set containing only the baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `names` into the extension, skipping duplicates.
    pub fn add<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if self.normalized.insert(normalize(&name)) {
                self.extra.push(name);
            }
        }
    }

    /// Replace the extension with `names`.
    pub fn set<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra.clear();
        self.normalized.clear();
        self.add(names);
    }

    /// Returns `true` if a field called `name` must be skipped.
    pub fn contains(&self, name: &str) -> bool {
        let key = normalize(name);
        is_baseline(&key) || self.normalized.contains(&key)
    }

    /// The configured extension, in insertion order.
    pub fn extra(&self) -> &[String] {
        &self.extra
    }

    /// Baseline followed by the extension.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        BASELINE_IGNORED
            .iter()
            .copied()
            .chain(self.extra.iter().map(String::as_str))
    }
}

fn is_baseline(normalized: &str) -> bool {
    matches!(normalized, "id" | "createdat" | "updatedat" | "deletedat")
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_matches_both_naming_conventions() {
        let set = IgnoreSet::new();
        for name in ["ID", "id", "CreatedAt", "created_at", "updated_at", "DeletedAt"] {
            assert!(set.contains(name), "{name} should be ignored");
        }
        assert!(!set.contains("Title"));
        assert!(!set.contains("identity"));
    }

    #[test]
    fn add_merges_without_duplicates() {
        let mut set = IgnoreSet::new();
        set.add(["Secret", "Token"]);
        set.add(["secret", "Notes"]);
        assert_eq!(set.extra(), &["Secret", "Token", "Notes"]);
        assert!(set.contains("notes"));
    }

    #[test]
    fn set_replaces_extension() {
        let mut set = IgnoreSet::new();
        set.add(["Secret"]);
        set.set(["Token"]);
        assert!(!set.contains("Secret"));
        assert!(set.contains("Token"));
        assert!(set.contains("ID"), "baseline survives replacement");
    }

    #[test]
    fn all_lists_baseline_first() {
        let mut set = IgnoreSet::new();
        set.add(["Secret"]);
        let all: Vec<_> = set.all().collect();
        assert_eq!(all, vec!["ID", "CreatedAt", "UpdatedAt", "DeletedAt", "Secret"]);
    }
}
