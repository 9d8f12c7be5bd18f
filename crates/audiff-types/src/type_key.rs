use std::fmt;

/// Runtime identity of a Rust type, used to key type handlers.
///
/// Wraps [`std::any::type_name`]. The name is only guaranteed to be stable
/// within a single build, which is all handler lookup needs: registration
/// and introspection both run in the same binary.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(&'static str);

impl TypeKey {
    /// The key for `T`.
    pub fn of<T: ?Sized>() -> Self {
        Self(std::any::type_name::<T>())
    }

    /// The key for the type of `sample`.
    pub fn of_val<T: ?Sized>(_sample: &T) -> Self {
        Self::of::<T>()
    }

    /// Fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.0
    }

    /// Type name with module paths stripped, including inside generic
    /// arguments: `alloc::vec::Vec<app::Tag>` becomes `Vec<Tag>`.
    pub fn short_name(&self) -> String {
        short_type_name(self.0)
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.0)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

/// Strip module paths from every path segment of a type name.
pub(crate) fn short_type_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut segment = String::new();
    for ch in name.chars() {
        match ch {
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&' | ';' => {
                out.push_str(last_path_segment(&segment));
                segment.clear();
                out.push(ch);
            }
            _ => segment.push(ch),
        }
    }
    out.push_str(last_path_segment(&segment));
    out
}

fn last_path_segment(segment: &str) -> &str {
    segment.rsplit("::").next().unwrap_or(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Post;

    #[test]
    fn keys_distinguish_types() {
        assert_eq!(TypeKey::of::<String>(), TypeKey::of::<String>());
        assert_ne!(TypeKey::of::<String>(), TypeKey::of::<Option<String>>());
        assert_eq!(TypeKey::of_val(&Post), TypeKey::of::<Post>());
    }

    #[test]
    fn short_name_strips_modules() {
        assert_eq!(TypeKey::of::<Post>().short_name(), "Post");
        assert_eq!(TypeKey::of::<Vec<Post>>().short_name(), "Vec<Post>");
        assert_eq!(
            TypeKey::of::<std::collections::HashMap<String, Option<Post>>>().short_name(),
            "HashMap<String, Option<Post>>"
        );
    }

    #[test]
    fn short_name_keeps_references_and_tuples() {
        assert_eq!(short_type_name("&str"), "&str");
        assert_eq!(short_type_name("(a::B, c::D)"), "(B, D)");
        assert_eq!(short_type_name("[core::u8; 4]"), "[u8; 4]");
    }
}
