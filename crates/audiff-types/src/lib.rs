//! Foundation types for audiff.
//!
//! This crate provides the plain data types shared by the diff engine, the
//! audit log, and the command-line front end. Every other audiff crate
//! depends on `audiff-types`.
//!
//! # Key Types
//!
//! - [`DiffRecord`] -- One field-level change (path, old rendering, new rendering)
//! - [`FieldPath`] / [`format_field_by_dot`] -- Dotted/indexed field locators
//! - [`TypeKey`] -- Runtime type identity used to key type handlers
//! - [`Media`] -- Media reference value object with curated audit semantics

pub mod error;
pub mod media;
pub mod path;
pub mod record;
pub mod type_key;

pub use error::TypeError;
pub use media::Media;
pub use path::{format_field_by_dot, FieldPath};
pub use record::{records_from_json, records_to_json, DiffRecord};
pub use type_key::TypeKey;
