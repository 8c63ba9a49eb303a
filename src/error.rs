//! Error types shared by every layer of the mapper.

use thiserror::Error;

use crate::registry::SemanticType;

/// Failure of a single value conversion, either between a Rust field and a
/// [`FieldValue`](crate::FieldValue) or between a `FieldValue` and a cell.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("expected {expected} value, found {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("value out of range for {target}")]
    OutOfRange { target: &'static str },
}

impl ValueError {
    pub fn mismatch(expected: &'static str, found: &'static str) -> Self {
        Self::Mismatch { expected, found }
    }
}

/// Errors raised by metadata extraction, row conversion and the CRUD calls.
#[derive(Debug, Error)]
pub enum OrmError {
    #[error("null entity supplied")]
    NullEntity,

    #[error("missing primary key on `{entity}`: {reason}")]
    MissingPrimaryKey { entity: String, reason: String },

    #[error("field `{entity}.{field}` has unmappable type {semantic_type}")]
    UnmappableField {
        entity: String,
        field: String,
        semantic_type: SemanticType,
    },

    #[error("no conversion registered for {0}")]
    UnregisteredType(SemanticType),

    #[error("column `{column}` declared twice on `{entity}`")]
    DuplicateColumn { entity: String, column: String },

    #[error("cannot access field `{field}`: {source}")]
    FieldAccess {
        field: String,
        #[source]
        source: ValueError,
    },

    #[error("row does not match table `{table}`: {reason}")]
    SchemaMismatch { table: String, reason: String },

    #[error("storage failure: {0}")]
    StorageFailure(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl OrmError {
    /// Wrap a storage collaborator error.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::StorageFailure(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, OrmError>;
