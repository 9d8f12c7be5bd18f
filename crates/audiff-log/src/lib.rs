//! Audit log for audiff.
//!
//! This crate wires the diff engine into an append-only change log:
//! - `ModelRegistry` / `FrozenRegistry` for per-model diff configuration
//! - `AuditEntry` records with JSON detail payloads
//! - `AuditLogWriter` / `AuditLogReader` trait boundaries
//! - `InMemoryAuditLog` implementation for tests and embedding
//! - `AuditLogger`, which writes an update entry only when a diff succeeds
//!   and reports at least one change

pub mod entry;
pub mod error;
pub mod logger;
pub mod memory;
pub mod registry;
pub mod traits;

pub use entry::{Action, AuditEntry};
pub use error::{AuditError, AuditResult};
pub use logger::AuditLogger;
pub use memory::InMemoryAuditLog;
pub use registry::{FrozenRegistry, ModelRegistration, ModelRegistry};
pub use traits::{AuditLogReader, AuditLogWriter};
