use crate::quota::QuotaVerdict;
use crate::types::DatasetKind;
use crate::validation::ValidationReport;

/// Failures of the load/save collaborator. Propagated to callers unchanged.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("storage backend failed: {0}")]
    Backend(#[from] sled::Error),
    #[error("failed to encode {what}: {message}")]
    Encode { what: &'static str, message: String },
    #[error("failed to decode stored value: {0}")]
    Decode(#[from] minicbor::decode::Error),
    #[error("stored value for {key} is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
}

/// A change event that cannot be applied to the targeted entity.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FieldError {
    #[error("field '{field}' does not exist on {kind} entries")]
    UnknownField {
        field: &'static str,
        kind: DatasetKind,
    },
    #[error("unrecognised field key '{0}'")]
    UnknownKey(String),
    #[error("field '{field}' expects a {expected} value")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("no {kind} entry with id '{id}'")]
    MissingEntity { kind: DatasetKind, id: String },
    #[error("an {kind} entry with id '{id}' already exists")]
    DuplicateEntity { kind: DatasetKind, id: String },
    #[error("a {actual} record cannot be stored in the {expected} dataset")]
    WrongDataset {
        expected: DatasetKind,
        actual: DatasetKind,
    },
    #[error("{0} entries are derived and cannot be edited")]
    ReadOnly(DatasetKind),
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("change rejected by validation: {0}")]
    Validation(ValidationReport),
    #[error("insufficient storage: {}", .0.error_message.as_deref().unwrap_or("write limit reached"))]
    StorageQuotaExceeded(QuotaVerdict),
    #[error("change cannot be applied: {0}")]
    InvalidChange(#[from] FieldError),
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

impl PipelineError {
    pub fn is_validation(&self) -> bool {
        matches!(self, PipelineError::Validation(_))
    }
    pub fn is_quota(&self) -> bool {
        matches!(self, PipelineError::StorageQuotaExceeded(_))
    }
}
