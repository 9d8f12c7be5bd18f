//! The introspected value model.
//!
//! Every value handed to the engine is converted once into a [`Node`] tree
//! (see [`crate::introspect`]). The walker and the type handlers only ever
//! look at nodes, never at the original Rust values.
//!
//! # Shapes
//!
//! | Node         | Produced by                                          |
//! |--------------|------------------------------------------------------|
//! | `Struct`     | structs, tuple/unit structs, enum variants           |
//! | `Sequence`   | `Vec`, slices, arrays, tuples, sets                  |
//! | `Mapping`    | maps with scalar keys                                |
//! | `Optional`   | `Option`, `()`, JSON `null`                          |
//! | `Scalar`     | numbers, booleans, chars, strings, bytes             |
//! | `Opaque`     | [`Opaque`](crate::Opaque)-wrapped values             |

use std::fmt;

use audiff_types::TypeKey;

/// A value, reduced to the shapes the walker understands.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Struct(StructNode),
    Sequence(Vec<Node>),
    Mapping(Vec<Entry>),
    Optional(Option<Box<Node>>),
    Scalar(Scalar),
    Opaque,
}

/// A struct or enum variant.
#[derive(Clone, Debug, PartialEq)]
pub struct StructNode {
    /// Type name as reported by `Serialize` (e.g. `Post`).
    pub name: &'static str,
    /// Active variant for enums, `None` for structs.
    pub variant: Option<&'static str>,
    /// Fields in declaration order. Positional fields are named `0`, `1`, ...
    pub fields: Vec<Field>,
}

/// One struct field together with its declared Rust type.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: TypeKey,
    pub value: Node,
}

/// One mapping entry; the key is already rendered.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub key: String,
    pub value: Node,
}

/// A leaf value.
#[derive(Clone, Debug)]
pub enum Scalar {
    Bool(bool),
    I64(i64),
    U64(u64),
    I128(i128),
    U128(u128),
    F32(f32),
    F64(f64),
    Char(char),
    Str(String),
    Bytes(Vec<u8>),
}

impl Scalar {
    /// Comparison class. Scalars of different classes are a type mismatch.
    pub fn kind(&self) -> &'static str {
        match self {
            Scalar::Bool(_) => "bool",
            Scalar::I64(_)
            | Scalar::U64(_)
            | Scalar::I128(_)
            | Scalar::U128(_)
            | Scalar::F32(_)
            | Scalar::F64(_) => "number",
            Scalar::Char(_) | Scalar::Str(_) => "string",
            Scalar::Bytes(_) => "bytes",
        }
    }

    /// Default string rendering.
    pub fn render(&self) -> String {
        match self {
            Scalar::Bool(v) => v.to_string(),
            Scalar::I64(v) => v.to_string(),
            Scalar::U64(v) => v.to_string(),
            Scalar::I128(v) => v.to_string(),
            Scalar::U128(v) => v.to_string(),
            Scalar::F32(v) => v.to_string(),
            Scalar::F64(v) => v.to_string(),
            Scalar::Char(v) => v.to_string(),
            Scalar::Str(v) => v.clone(),
            Scalar::Bytes(v) => {
                let parts: Vec<String> = v.iter().map(u8::to_string).collect();
                format!("[{}]", parts.join(" "))
            }
        }
    }

    /// Value equality within a comparison class.
    ///
    /// Integers compare by value regardless of width. Floats compare
    /// bitwise first so that `NaN` equals itself.
    pub fn same_value(&self, other: &Scalar) -> bool {
        use Scalar::*;
        match (self, other) {
            (Bool(a), Bool(b)) => a == b,
            (F64(a), F64(b)) => a.to_bits() == b.to_bits() || a == b,
            (F32(a), F32(b)) => a.to_bits() == b.to_bits() || a == b,
            (Str(a), Str(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (U128(a), U128(b)) => a == b,
            _ => match (self.as_i128(), other.as_i128()) {
                (Some(a), Some(b)) => a == b,
                _ => self.kind() == other.kind() && self.render() == other.render(),
            },
        }
    }

    fn as_i128(&self) -> Option<i128> {
        match self {
            Scalar::I64(v) => Some(i128::from(*v)),
            Scalar::U64(v) => Some(i128::from(*v)),
            Scalar::I128(v) => Some(*v),
            Scalar::U128(v) => i128::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.same_value(other)
    }
}

impl Node {
    /// A string scalar.
    pub fn string(value: impl Into<String>) -> Self {
        Node::Scalar(Scalar::Str(value.into()))
    }

    /// An empty optional.
    pub fn none() -> Self {
        Node::Optional(None)
    }

    /// A populated optional.
    pub fn some(inner: Node) -> Self {
        Node::Optional(Some(Box::new(inner)))
    }

    /// Label used in type-mismatch errors: the struct name for structs,
    /// the shape or scalar class otherwise.
    pub fn type_label(&self) -> String {
        match self {
            Node::Struct(s) => s.name.to_string(),
            Node::Sequence(_) => "sequence".into(),
            Node::Mapping(_) => "map".into(),
            Node::Optional(_) => "optional".into(),
            Node::Scalar(s) => s.kind().into(),
            Node::Opaque => "opaque".into(),
        }
    }

    /// Whole-value rendering, used when a value exists on one side only.
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Returns `true` for `Optional(None)`.
    pub fn is_empty_optional(&self) -> bool {
        matches!(self, Node::Optional(None))
    }

    /// Strip any number of populated optional layers.
    pub fn unwrap_optional(&self) -> &Node {
        let mut node = self;
        while let Node::Optional(Some(inner)) = node {
            node = inner;
        }
        node
    }

    pub fn as_struct(&self) -> Option<&StructNode> {
        match self {
            Node::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[Entry]> {
        match self {
            Node::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// The string content of a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Look up a struct field's value by name.
    pub fn field(&self, name: &str) -> Option<&Node> {
        self.as_struct().and_then(|s| s.field(name)).map(|f| &f.value)
    }
}

impl StructNode {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Struct(s) => {
                if let Some(variant) = s.variant {
                    if s.fields.is_empty() {
                        return f.write_str(variant);
                    }
                    f.write_str(variant)?;
                }
                f.write_str("{")?;
                for (i, field) in s.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}:{}", field.name, field.value)?;
                }
                f.write_str("}")
            }
            Node::Sequence(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Node::Mapping(entries) => {
                f.write_str("map[")?;
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}:{}", entry.key, entry.value)?;
                }
                f.write_str("]")
            }
            Node::Optional(None) => f.write_str("<nil>"),
            Node::Optional(Some(inner)) => write!(f, "{inner}"),
            Node::Scalar(s) => f.write_str(&s.render()),
            Node::Opaque => f.write_str("<opaque>"),
        }
    }
}
