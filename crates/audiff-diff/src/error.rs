//! Error types for the diff crate.

use std::fmt::Display;

/// Errors that can occur during a diff call.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// Old and new values have different types at some recursion point.
    #[error("old and new type mismatch: {old} != {new}")]
    TypeMismatch { old: String, new: String },

    /// A type handler returned an error or panicked.
    #[error("type handler failed at `{field_path}`: {cause}")]
    HandlerFailure {
        /// Path of the field the handler was invoked for.
        field_path: String,
        #[source]
        cause: HandlerError,
    },

    /// The value nests deeper than the configured limit, which usually
    /// means a cyclic `Rc`/`Arc` graph.
    #[error("nesting depth limit {limit} exceeded at `{path}`; possible cyclic reference")]
    DepthLimitExceeded { path: String, limit: usize },

    /// A mapping key that has no scalar rendering.
    #[error("unsupported map key at `{path}`: expected a scalar key, found {kind}")]
    UnsupportedMapKey { path: String, kind: String },

    /// A `Serialize` implementation reported an error.
    #[error("introspection error: {0}")]
    Introspection(String),

    /// Diff settings could not be parsed.
    #[error("invalid diff settings: {0}")]
    Config(String),
}

impl serde::ser::Error for DiffError {
    fn custom<T: Display>(msg: T) -> Self {
        DiffError::Introspection(msg.to_string())
    }
}

/// Errors reported by a type handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    /// The handler was given a node of a shape it does not understand.
    #[error("unexpected value shape: expected {expected}, found {found}")]
    UnexpectedShape { expected: String, found: String },

    /// The value had the right shape but unusable content.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// The handler panicked; the payload message is preserved.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    /// Shorthand for [`HandlerError::UnexpectedShape`].
    pub fn unexpected(expected: impl Into<String>, found: impl Into<String>) -> Self {
        HandlerError::UnexpectedShape {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
