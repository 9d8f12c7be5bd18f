//! Type handlers: per-type overrides of the walker's default recursion.
//!
//! A handler receives the old and new [`Node`]s of a struct field whose
//! declared type it was registered for, plus the field's path, and returns
//! the records for that field. Handlers report bad input through
//! [`HandlerError`]; panics are caught at the call site and converted into
//! [`DiffError::HandlerFailure`] as well.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::warn;

use audiff_types::{format_field_by_dot, DiffRecord, TypeKey};

use crate::error::{DiffError, DiffResult, HandlerError};
use crate::node::Node;

/// A shared type handler.
pub type TypeHandler =
    Arc<dyn Fn(&Node, &Node, &str) -> Result<Vec<DiffRecord>, HandlerError> + Send + Sync>;

/// Handlers keyed by the declared Rust type they apply to.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<TypeKey, TypeHandler>,
}

impl HandlerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or overwrite) the handler for `T`.
    pub fn insert<T, F>(&mut self, handler: F)
    where
        T: ?Sized,
        F: Fn(&Node, &Node, &str) -> Result<Vec<DiffRecord>, HandlerError> + Send + Sync + 'static,
    {
        self.insert_key(TypeKey::of::<T>(), Arc::new(handler));
    }

    /// Register (or overwrite) a handler under an explicit key.
    pub fn insert_key(&mut self, key: TypeKey, handler: TypeHandler) {
        self.handlers.insert(key, handler);
    }

    pub fn get(&self, key: &TypeKey) -> Option<&TypeHandler> {
        self.handlers.get(key)
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.handlers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered type keys, sorted by name.
    pub fn keys(&self) -> Vec<TypeKey> {
        let mut keys: Vec<_> = self.handlers.keys().copied().collect();
        keys.sort();
        keys
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys()).finish()
    }
}

/// Call `handler`, turning both error returns and panics into
/// [`DiffError::HandlerFailure`].
///
/// Containing a panic does not silence it: the process panic hook still
/// runs first, so the default hook prints the message (and a backtrace when
/// `RUST_BACKTRACE` is set) to stderr. Handlers should return
/// [`HandlerError`] for expected failures.
pub(crate) fn invoke(
    handler: &TypeHandler,
    old: &Node,
    new: &Node,
    field_path: &str,
) -> DiffResult<Vec<DiffRecord>> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(old, new, field_path)));
    let cause = match outcome {
        Ok(Ok(records)) => return Ok(records),
        Ok(Err(cause)) => cause,
        Err(payload) => HandlerError::Panicked(panic_message(payload.as_ref())),
    };
    warn!(field = field_path, error = %cause, "type handler failed");
    Err(DiffError::HandlerFailure {
        field_path: field_path.to_string(),
        cause,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// How a pair of possibly-optional nodes should be handled.
#[derive(Debug)]
pub enum Presence<'a> {
    /// Both sides are empty optionals.
    Neither,
    /// Exactly one side is empty; the record renders the other side whole.
    OneSided(DiffRecord),
    /// Both sides are populated; optional layers are stripped.
    Both(&'a Node, &'a Node),
}

/// Apply the optional rule to `old`/`new`, for handlers registered on
/// `Option<T>` types.
pub fn presence<'a>(old: &'a Node, new: &'a Node, field_path: &str) -> Presence<'a> {
    match (old.is_empty_optional(), new.is_empty_optional()) {
        (true, true) => Presence::Neither,
        (true, false) => Presence::OneSided(DiffRecord::added(field_path, new.render())),
        (false, true) => Presence::OneSided(DiffRecord::removed(field_path, old.render())),
        (false, false) => Presence::Both(old.unwrap_optional(), new.unwrap_optional()),
    }
}

/// A handler for sequences of records that compares elements positionally
/// by a single field (typically a name) and reports appended or removed
/// elements whole.
///
/// Useful for collections whose elements carry noisy metadata: only a
/// change of `field` is reported for elements present on both sides.
pub fn compare_by_field(
    field: &'static str,
) -> impl Fn(&Node, &Node, &str) -> Result<Vec<DiffRecord>, HandlerError> + Send + Sync + 'static
{
    move |old: &Node, new: &Node, path: &str| -> Result<Vec<DiffRecord>, HandlerError> {
        let (old, new) = match presence(old, new, path) {
            Presence::Neither => return Ok(Vec::new()),
            Presence::OneSided(record) => return Ok(vec![record]),
            Presence::Both(old, new) => (old, new),
        };
        let old_items = old
            .as_sequence()
            .ok_or_else(|| HandlerError::unexpected("sequence", old.type_label()))?;
        let new_items = new
            .as_sequence()
            .ok_or_else(|| HandlerError::unexpected("sequence", new.type_label()))?;

        let mut records = Vec::new();
        let common = old_items.len().min(new_items.len());
        for (i, (o, n)) in old_items.iter().zip(new_items).enumerate() {
            let o = o
                .unwrap_optional()
                .field(field)
                .ok_or_else(|| {
                    HandlerError::unexpected(format!("field `{field}`"), o.type_label())
                })?;
            let n = n
                .unwrap_optional()
                .field(field)
                .ok_or_else(|| {
                    HandlerError::unexpected(format!("field `{field}`"), n.type_label())
                })?;
            let (o, n) = (o.render(), n.render());
            if o != n {
                let element = format_field_by_dot(path, &i.to_string());
                records.push(DiffRecord::new(format_field_by_dot(&element, field), o, n));
            }
        }
        for (i, item) in new_items.iter().enumerate().skip(common) {
            records.push(DiffRecord::added(
                format_field_by_dot(path, &i.to_string()),
                item.render(),
            ));
        }
        for (i, item) in old_items.iter().enumerate().skip(common) {
            records.push(DiffRecord::removed(
                format_field_by_dot(path, &i.to_string()),
                item.render(),
            ));
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;
    use crate::introspect::introspect;

    #[derive(Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Tag {
        name: String,
        hits: u32,
    }

    fn tags(items: &[(&str, u32)]) -> Node {
        let tags: Vec<Tag> = items
            .iter()
            .map(|(name, hits)| Tag {
                name: name.to_string(),
                hits: *hits,
            })
            .collect();
        introspect(&tags, 16).unwrap()
    }

    #[test]
    fn registry_overwrites_per_type() {
        let mut registry = HandlerRegistry::new();
        registry.insert::<String, _>(|_, _, _| Ok(vec![]));
        registry.insert::<String, _>(|_, _, p| Ok(vec![DiffRecord::new(p, "a", "b")]));
        assert_eq!(registry.len(), 1);
        let handler = registry.get(&TypeKey::of::<String>()).unwrap();
        let records = invoke(handler, &Node::none(), &Node::none(), "x").unwrap();
        assert_eq!(records, vec![DiffRecord::new("x", "a", "b")]);
        assert!(!registry.contains(&TypeKey::of::<u32>()));
    }

    #[test]
    fn handler_errors_carry_the_field_path() {
        let handler: TypeHandler = Arc::new(|_: &Node, _: &Node, _: &str| {
            Err(HandlerError::InvalidValue("bad".into()))
        });
        let err = invoke(&handler, &Node::none(), &Node::none(), "Cover").unwrap_err();
        match err {
            DiffError::HandlerFailure { field_path, cause } => {
                assert_eq!(field_path, "Cover");
                assert_eq!(cause, HandlerError::InvalidValue("bad".into()));
            }
            other => panic!("expected HandlerFailure, got {other:?}"),
        }
    }

    #[test]
    fn handler_panics_are_contained() {
        let handler: TypeHandler = Arc::new(
            |_: &Node, _: &Node, _: &str| -> Result<Vec<DiffRecord>, HandlerError> {
                panic!("assertion failed: wrong type")
            },
        );
        let err = invoke(&handler, &Node::none(), &Node::none(), "Tags").unwrap_err();
        assert!(matches!(
            err,
            DiffError::HandlerFailure { cause: HandlerError::Panicked(ref msg), .. }
                if msg.contains("wrong type")
        ));
    }

    #[test]
    fn presence_follows_the_optional_rule() {
        let some = Node::some(Node::string("x"));
        assert!(matches!(presence(&Node::none(), &Node::none(), "p"), Presence::Neither));
        match presence(&Node::none(), &some, "p") {
            Presence::OneSided(record) => assert_eq!(record, DiffRecord::added("p", "x")),
            other => panic!("unexpected {other:?}"),
        }
        match presence(&some, &some, "p") {
            Presence::Both(o, n) => {
                assert_eq!(o.as_str(), Some("x"));
                assert_eq!(n.as_str(), Some("x"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn compare_by_field_ignores_other_fields() {
        let handler = compare_by_field("Name");
        let old = tags(&[("rust", 1), ("go", 2)]);
        let new = tags(&[("rust", 9), ("golang", 2), ("zig", 0)]);
        let records = handler(&old, &new, "Tags").unwrap();
        assert_eq!(
            records,
            vec![
                DiffRecord::new("Tags.1.Name", "go", "golang"),
                DiffRecord::added("Tags.2", "{Name:zig Hits:0}"),
            ]
        );
    }

    #[test]
    fn compare_by_field_reports_removals() {
        let handler = compare_by_field("Name");
        let records = handler(&tags(&[("a", 1), ("b", 1)]), &tags(&[("a", 1)]), "Tags").unwrap();
        assert_eq!(records, vec![DiffRecord::removed("Tags.1", "{Name:b Hits:1}")]);
    }

    #[test]
    fn compare_by_field_rejects_non_sequences() {
        let handler = compare_by_field("Name");
        let err = handler(&Node::string("a"), &Node::string("b"), "Tags").unwrap_err();
        assert!(matches!(err, HandlerError::UnexpectedShape { .. }));
    }
}
