//! Conversion of `Serialize` values into [`Node`] trees.
//!
//! [`Introspector`] is a `serde::Serializer` whose output is a [`Node`]. It
//! records the declared Rust type of every struct field (via
//! [`TypeKey::of`]) so type handlers can be looked up later without touching
//! the original value. Nesting depth is bounded; exceeding the bound fails
//! with [`DiffError::DepthLimitExceeded`].

use serde::ser::{self, Serialize};

use audiff_types::{FieldPath, TypeKey};

use crate::error::{DiffError, DiffResult};
use crate::node::{Entry, Field, Node, Scalar, StructNode};

/// Newtype-struct name used by [`Opaque`] to mark its content.
pub(crate) const OPAQUE_TOKEN: &str = "$audiff::private::Opaque";

/// Struct name given to derived structs serialized through a map, which
/// happens when one of their fields is `#[serde(flatten)]`.
pub const FLATTENED_STRUCT: &str = "flattened struct";

/// Wrapper for values that must never be audited.
///
/// The walker emits nothing for opaque values, whatever they contain. Other
/// serializers see a plain unit value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Opaque<T>(pub T);

impl<T> Serialize for Opaque<T> {
    fn serialize<S: ser::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(OPAQUE_TOKEN, &())
    }
}

/// Introspect `value` into a [`Node`], failing beyond `max_depth` levels.
pub fn introspect<T: ?Sized + Serialize>(value: &T, max_depth: usize) -> DiffResult<Node> {
    value.serialize(Introspector::new(max_depth))
}

/// A serializer producing [`Node`]s.
#[derive(Clone, Debug)]
pub struct Introspector {
    path: FieldPath,
    depth: usize,
    max_depth: usize,
}

impl Introspector {
    /// A root introspector.
    pub fn new(max_depth: usize) -> Self {
        Self {
            path: FieldPath::root(),
            depth: 0,
            max_depth,
        }
    }

    fn descend(&self, path: FieldPath) -> DiffResult<Self> {
        if self.depth >= self.max_depth {
            return Err(DiffError::DepthLimitExceeded {
                path: path.to_string(),
                limit: self.max_depth,
            });
        }
        Ok(Self {
            path,
            depth: self.depth + 1,
            max_depth: self.max_depth,
        })
    }

    fn child<T: ?Sized + Serialize>(&self, segment: &str, value: &T) -> DiffResult<Node> {
        value.serialize(self.descend(self.path.child(segment))?)
    }

    fn struct_builder(
        self,
        name: &'static str,
        variant: Option<&'static str>,
        len: usize,
    ) -> StructBuilder {
        StructBuilder {
            parent: self,
            node: StructNode {
                name,
                variant,
                fields: Vec::with_capacity(len),
            },
        }
    }
}

/// Render a map key, if it has a scalar form.
fn render_key(node: &Node) -> Option<String> {
    match node {
        Node::Scalar(s) => Some(s.render()),
        Node::Struct(StructNode {
            variant: Some(variant),
            fields,
            ..
        }) if fields.is_empty() => Some((*variant).to_string()),
        _ => None,
    }
}

impl ser::Serializer for Introspector {
    type Ok = Node;
    type Error = DiffError;

    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = StructBuilder;
    type SerializeTupleVariant = StructBuilder;
    type SerializeMap = MapBuilder;
    type SerializeStruct = StructBuilder;
    type SerializeStructVariant = StructBuilder;

    fn serialize_bool(self, v: bool) -> DiffResult<Node> {
        Ok(Node::Scalar(Scalar::Bool(v)))
    }

    fn serialize_i8(self, v: i8) -> DiffResult<Node> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> DiffResult<Node> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> DiffResult<Node> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> DiffResult<Node> {
        Ok(Node::Scalar(Scalar::I64(v)))
    }

    fn serialize_i128(self, v: i128) -> DiffResult<Node> {
        Ok(Node::Scalar(Scalar::I128(v)))
    }

    fn serialize_u8(self, v: u8) -> DiffResult<Node> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u16(self, v: u16) -> DiffResult<Node> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u32(self, v: u32) -> DiffResult<Node> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u64(self, v: u64) -> DiffResult<Node> {
        Ok(Node::Scalar(Scalar::U64(v)))
    }

    fn serialize_u128(self, v: u128) -> DiffResult<Node> {
        Ok(Node::Scalar(Scalar::U128(v)))
    }

    fn serialize_f32(self, v: f32) -> DiffResult<Node> {
        Ok(Node::Scalar(Scalar::F32(v)))
    }

    fn serialize_f64(self, v: f64) -> DiffResult<Node> {
        Ok(Node::Scalar(Scalar::F64(v)))
    }

    fn serialize_char(self, v: char) -> DiffResult<Node> {
        Ok(Node::Scalar(Scalar::Char(v)))
    }

    fn serialize_str(self, v: &str) -> DiffResult<Node> {
        Ok(Node::string(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> DiffResult<Node> {
        Ok(Node::Scalar(Scalar::Bytes(v.to_vec())))
    }

    fn serialize_none(self) -> DiffResult<Node> {
        Ok(Node::none())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> DiffResult<Node> {
        let inner = value.serialize(self.descend(self.path.clone())?)?;
        Ok(Node::some(inner))
    }

    fn serialize_unit(self) -> DiffResult<Node> {
        Ok(Node::none())
    }

    fn serialize_unit_struct(self, name: &'static str) -> DiffResult<Node> {
        Ok(Node::Struct(StructNode {
            name,
            variant: None,
            fields: Vec::new(),
        }))
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> DiffResult<Node> {
        Ok(Node::Struct(StructNode {
            name,
            variant: Some(variant),
            fields: Vec::new(),
        }))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        name: &'static str,
        value: &T,
    ) -> DiffResult<Node> {
        if name == OPAQUE_TOKEN {
            return Ok(Node::Opaque);
        }
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> DiffResult<Node> {
        let node = self.child("0", value)?;
        Ok(Node::Struct(StructNode {
            name,
            variant: Some(variant),
            fields: vec![Field {
                name: "0".into(),
                ty: TypeKey::of::<T>(),
                value: node,
            }],
        }))
    }

    fn serialize_seq(self, len: Option<usize>) -> DiffResult<SeqBuilder> {
        Ok(SeqBuilder {
            parent: self,
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> DiffResult<SeqBuilder> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, name: &'static str, len: usize) -> DiffResult<StructBuilder> {
        Ok(self.struct_builder(name, None, len))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> DiffResult<StructBuilder> {
        Ok(self.struct_builder(name, Some(variant), len))
    }

    fn serialize_map(self, len: Option<usize>) -> DiffResult<MapBuilder> {
        Ok(MapBuilder {
            parent: self,
            entries: Vec::with_capacity(len.unwrap_or(0)),
            types: Vec::with_capacity(len.unwrap_or(0)),
            pending_key: None,
            unsized_len: len.is_none(),
            text_keys: true,
        })
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> DiffResult<StructBuilder> {
        Ok(self.struct_builder(name, None, len))
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> DiffResult<StructBuilder> {
        Ok(self.struct_builder(name, Some(variant), len))
    }
}

/// Builder for sequences and tuples.
pub struct SeqBuilder {
    parent: Introspector,
    items: Vec<Node>,
}

impl SeqBuilder {
    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> DiffResult<()> {
        let index = self.items.len().to_string();
        let node = self.parent.child(&index, value)?;
        self.items.push(node);
        Ok(())
    }
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = Node;
    type Error = DiffError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> DiffResult<()> {
        self.push(value)
    }

    fn end(self) -> DiffResult<Node> {
        Ok(Node::Sequence(self.items))
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = Node;
    type Error = DiffError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> DiffResult<()> {
        self.push(value)
    }

    fn end(self) -> DiffResult<Node> {
        Ok(Node::Sequence(self.items))
    }
}

/// Builder for structs, tuple structs, and data-carrying enum variants.
pub struct StructBuilder {
    parent: Introspector,
    node: StructNode,
}

impl StructBuilder {
    fn push<T: ?Sized + Serialize>(&mut self, name: String, value: &T) -> DiffResult<()> {
        let node = self.parent.child(&name, value)?;
        self.node.fields.push(Field {
            name,
            ty: TypeKey::of::<T>(),
            value: node,
        });
        Ok(())
    }

    fn push_positional<T: ?Sized + Serialize>(&mut self, value: &T) -> DiffResult<()> {
        let name = self.node.fields.len().to_string();
        self.push(name, value)
    }

    fn finish(self) -> Node {
        Node::Struct(self.node)
    }
}

impl ser::SerializeStruct for StructBuilder {
    type Ok = Node;
    type Error = DiffError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> DiffResult<()> {
        self.push(key.to_string(), value)
    }

    fn end(self) -> DiffResult<Node> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for StructBuilder {
    type Ok = Node;
    type Error = DiffError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> DiffResult<()> {
        self.push(key.to_string(), value)
    }

    fn end(self) -> DiffResult<Node> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for StructBuilder {
    type Ok = Node;
    type Error = DiffError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> DiffResult<()> {
        self.push_positional(value)
    }

    fn end(self) -> DiffResult<Node> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for StructBuilder {
    type Ok = Node;
    type Error = DiffError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> DiffResult<()> {
        self.push_positional(value)
    }

    fn end(self) -> DiffResult<Node> {
        Ok(self.finish())
    }
}

/// Builder for maps. Keys must render as scalars.
///
/// Derived structs with a `#[serde(flatten)]` field serialize as a map of
/// unknown length keyed by field names. Such maps are turned back into a
/// struct node named [`FLATTENED_STRUCT`], with each entry's declared type
/// kept, so ignore rules and type handlers apply to their fields.
pub struct MapBuilder {
    parent: Introspector,
    entries: Vec<Entry>,
    types: Vec<TypeKey>,
    pending_key: Option<String>,
    unsized_len: bool,
    text_keys: bool,
}

impl MapBuilder {
    fn finish(self) -> Node {
        if !(self.unsized_len && self.text_keys) {
            return Node::Mapping(self.entries);
        }
        let fields = self
            .entries
            .into_iter()
            .zip(self.types)
            .map(|(entry, ty)| Field {
                name: entry.key,
                ty,
                value: entry.value,
            })
            .collect();
        Node::Struct(StructNode {
            name: FLATTENED_STRUCT,
            variant: None,
            fields,
        })
    }
}

impl ser::SerializeMap for MapBuilder {
    type Ok = Node;
    type Error = DiffError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> DiffResult<()> {
        let node = key.serialize(self.parent.descend(self.parent.path.clone())?)?;
        let rendered = render_key(&node).ok_or_else(|| DiffError::UnsupportedMapKey {
            path: self.parent.path.to_string(),
            kind: node.type_label(),
        })?;
        self.text_keys &= matches!(node, Node::Scalar(Scalar::Str(_)));
        self.pending_key = Some(rendered);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> DiffResult<()> {
        let key = self.pending_key.take().ok_or_else(|| {
            DiffError::Introspection("map value serialized before its key".into())
        })?;
        let node = self.parent.child(&key, value)?;
        self.entries.push(Entry { key, value: node });
        self.types.push(TypeKey::of::<T>());
        Ok(())
    }

    fn end(self) -> DiffResult<Node> {
        Ok(self.finish())
    }
}
