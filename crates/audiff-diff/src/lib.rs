//! Structural diff engine for audiff.
//!
//! Compares two values of the same type field by field and produces an
//! ordered list of [`DiffRecord`]s describing what changed, for use as
//! audit-log detail payloads.
//!
//! Values are introspected once through `serde::Serialize` into a [`Node`]
//! tree; the [`Walker`] then compares the trees without further reflection.
//!
//! # Key Types
//!
//! - [`DiffEngine`] -- Façade bound to one frozen [`DiffConfig`]
//! - [`DiffConfig`] / [`DiffSettings`] -- Ignore rules, caller handlers, limits
//! - [`IgnoreSet`] -- Baseline and extension of ignored field names
//! - [`HandlerRegistry`] / [`TypeHandler`] -- Per-type overrides of recursion
//! - [`Node`] -- Introspected value model
//! - [`Opaque`] -- Wrapper for values that are never audited
//!
//! # Example
//!
//! ```
//! use audiff_diff::{DiffConfig, DiffEngine};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Post {
//!     id: u64,
//!     title: String,
//! }
//!
//! let engine = DiffEngine::new(DiffConfig::new());
//! let records = engine
//!     .diff(
//!         &Post { id: 1, title: "draft".into() },
//!         &Post { id: 2, title: "final".into() },
//!     )
//!     .unwrap();
//!
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].field_path, "title");
//! ```

pub mod config;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod handler;
pub mod ignore;
pub mod introspect;
pub mod node;
pub mod walker;

pub use audiff_types::DiffRecord;
pub use config::{DiffConfig, DiffSettings, DEFAULT_MAX_DEPTH};
pub use defaults::default_handlers;
pub use engine::{diff_with, DiffEngine};
pub use error::{DiffError, DiffResult, HandlerError};
pub use handler::{compare_by_field, presence, HandlerRegistry, Presence, TypeHandler};
pub use ignore::{IgnoreSet, BASELINE_IGNORED};
pub use introspect::{introspect, Introspector, Opaque, FLATTENED_STRUCT};
pub use node::{Entry, Field, Node, Scalar, StructNode};
pub use walker::Walker;
