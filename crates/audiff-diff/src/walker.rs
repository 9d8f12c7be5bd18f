//! The recursive classify-and-emit core.
//!
//! [`Walker`] compares two [`Node`] trees and accumulates [`DiffRecord`]s in
//! depth-first order. It reads an immutable [`DiffConfig`] and the default
//! handler registry and holds no other state, so it can be exercised on
//! hand-built nodes without any serde involvement.
//!
//! # Alignment
//!
//! Sequences are aligned by position: inserting an element in the middle
//! reports every later element as changed, followed by one appended element.
//! Mappings are aligned by key. Neither attempts minimal edit distance.

use std::collections::HashMap;

use audiff_types::{DiffRecord, FieldPath};

use crate::config::DiffConfig;
use crate::error::{DiffError, DiffResult};
use crate::handler::{invoke, HandlerRegistry};
use crate::node::{Entry, Field, Node, StructNode};

/// Accumulates records for a single diff call.
pub struct Walker<'a> {
    config: &'a DiffConfig,
    defaults: &'a HandlerRegistry,
    records: Vec<DiffRecord>,
}

impl<'a> Walker<'a> {
    pub fn new(config: &'a DiffConfig, defaults: &'a HandlerRegistry) -> Self {
        Self {
            config,
            defaults,
            records: Vec::new(),
        }
    }

    /// Records emitted so far.
    pub fn records(&self) -> &[DiffRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<DiffRecord> {
        self.records
    }

    /// Compare `old` and `new` at `path`.
    pub fn walk(&mut self, old: &Node, new: &Node, path: &FieldPath) -> DiffResult<()> {
        match (old, new) {
            (Node::Opaque, _) | (_, Node::Opaque) => Ok(()),

            (Node::Optional(None), Node::Optional(None)) => Ok(()),
            (Node::Optional(None), populated) => {
                self.emit(DiffRecord::added(path.as_str(), populated.render()));
                Ok(())
            }
            (populated, Node::Optional(None)) => {
                self.emit(DiffRecord::removed(path.as_str(), populated.render()));
                Ok(())
            }
            (Node::Optional(Some(old)), new) => self.walk(old, new, path),
            (old, Node::Optional(Some(new))) => self.walk(old, new, path),

            (Node::Struct(o), Node::Struct(n)) => self.walk_struct(o, n, old, new, path),
            (Node::Sequence(o), Node::Sequence(n)) => self.walk_sequence(o, n, path),
            (Node::Mapping(o), Node::Mapping(n)) => self.walk_mapping(o, n, path),

            (Node::Scalar(o), Node::Scalar(n)) => {
                if o.kind() != n.kind() {
                    return Err(mismatch(old, new));
                }
                if !o.same_value(n) {
                    self.emit(DiffRecord::new(path.as_str(), o.render(), n.render()));
                }
                Ok(())
            }

            _ => Err(mismatch(old, new)),
        }
    }

    fn walk_struct(
        &mut self,
        o: &StructNode,
        n: &StructNode,
        old: &Node,
        new: &Node,
        path: &FieldPath,
    ) -> DiffResult<()> {
        if o.name != n.name {
            return Err(mismatch(old, new));
        }
        if o.variant != n.variant {
            self.emit(DiffRecord::new(path.as_str(), old.render(), new.render()));
            return Ok(());
        }

        for old_field in &o.fields {
            if self.config.is_ignored(&old_field.name) {
                continue;
            }
            let child = path.child(&old_field.name);
            match n.field(&old_field.name) {
                Some(new_field) => self.walk_field(old_field, new_field, &child)?,
                None => self.walk_field(old_field, &absent(old_field), &child)?,
            }
        }
        for new_field in &n.fields {
            if self.config.is_ignored(&new_field.name) || o.field(&new_field.name).is_some() {
                continue;
            }
            let child = path.child(&new_field.name);
            self.walk_field(&absent(new_field), new_field, &child)?;
        }
        Ok(())
    }

    fn walk_field(&mut self, old: &Field, new: &Field, path: &FieldPath) -> DiffResult<()> {
        let (defaults, config) = (self.defaults, self.config);
        // Defaults win over caller-registered handlers for the same type.
        let handler = defaults
            .get(&old.ty)
            .or_else(|| config.handlers().get(&old.ty));
        match handler {
            Some(handler) => {
                let records = invoke(handler, &old.value, &new.value, path.as_str())?;
                self.records.extend(records);
                Ok(())
            }
            None => self.walk(&old.value, &new.value, path),
        }
    }

    fn walk_sequence(&mut self, old: &[Node], new: &[Node], path: &FieldPath) -> DiffResult<()> {
        let common = old.len().min(new.len());
        for (i, (o, n)) in old.iter().zip(new).enumerate() {
            self.walk(o, n, &path.index(i))?;
        }
        for (i, item) in new.iter().enumerate().skip(common) {
            self.emit(DiffRecord::added(path.index(i).as_str(), item.render()));
        }
        for (i, item) in old.iter().enumerate().skip(common) {
            self.emit(DiffRecord::removed(path.index(i).as_str(), item.render()));
        }
        Ok(())
    }

    fn walk_mapping(&mut self, old: &[Entry], new: &[Entry], path: &FieldPath) -> DiffResult<()> {
        let old_index: HashMap<&str, &Node> =
            old.iter().map(|e| (e.key.as_str(), &e.value)).collect();
        let new_index: HashMap<&str, &Node> =
            new.iter().map(|e| (e.key.as_str(), &e.value)).collect();

        let mut removed = Vec::new();
        for entry in old {
            if self.skip_key(&entry.key) {
                continue;
            }
            match new_index.get(entry.key.as_str()) {
                Some(new_value) => self.walk(&entry.value, new_value, &path.child(&entry.key))?,
                None => removed.push(entry),
            }
        }
        for entry in new {
            if self.skip_key(&entry.key) || old_index.contains_key(entry.key.as_str()) {
                continue;
            }
            self.emit(DiffRecord::added(
                path.child(&entry.key).as_str(),
                entry.value.render(),
            ));
        }
        for entry in removed {
            self.emit(DiffRecord::removed(
                path.child(&entry.key).as_str(),
                entry.value.render(),
            ));
        }
        Ok(())
    }

    fn skip_key(&self, key: &str) -> bool {
        self.config.ignore_map_keys() && self.config.is_ignored(key)
    }

    fn emit(&mut self, record: DiffRecord) {
        self.records.push(record);
    }
}

/// Stand-in for a field that `skip_serializing_if` left out on one side.
/// It keeps the declared type so handlers still see the field.
fn absent(field: &Field) -> Field {
    Field {
        name: field.name.clone(),
        ty: field.ty,
        value: Node::none(),
    }
}

fn mismatch(old: &Node, new: &Node) -> DiffError {
    DiffError::TypeMismatch {
        old: old.type_label(),
        new: new.type_label(),
    }
}
