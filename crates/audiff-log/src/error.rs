use audiff_diff::DiffError;
use audiff_types::TypeError;
use uuid::Uuid;

/// Errors produced by audit-log operations.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error("model not registered: {0}")]
    UnknownModel(String),

    #[error("duplicate audit entry: {0}")]
    DuplicateEntry(Uuid),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store error: {0}")]
    Store(String),
}

impl From<TypeError> for AuditError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::Serialization(msg) => AuditError::Serialization(msg),
        }
    }
}

/// Convenience alias for audit-log results.
pub type AuditResult<T> = Result<T, AuditError>;
