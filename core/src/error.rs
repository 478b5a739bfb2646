use thiserror::Error;
use uuid::Uuid;

use crate::model::record::Collection;

/// Failures raised while validating or locating records at the store boundary.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("{collection}: field `{field}` holds malformed date `{value}` (expected YYYY-MM-DD)")]
    MalformedDate {
        collection: Collection,
        field: String,
        value: String,
    },
    #[error("{collection}: missing required field `{field}`")]
    MissingField {
        collection: Collection,
        field: String,
    },
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("unknown collection: {0}")]
    UnknownCollection(String),
    #[error("{collection}: record {id} not found")]
    NotFound { collection: Collection, id: Uuid },
    /// A store handed back a record from another collection than the one
    /// asked for. The file store scopes lookups by collection and never does
    /// this; the check guards other `RecordRepository` implementations.
    #[error("expected a {expected} record, found {found}")]
    WrongCollection {
        expected: Collection,
        found: Collection,
    },
}
