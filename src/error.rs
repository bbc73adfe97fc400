//! Errors raised around the engine: request validation and the record
//! store.  The engine itself is total and has no error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QaError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("record not found: {id}")]
    NotFound { id: String },

    #[error("backup contains no records")]
    EmptyBackup,

    #[error("record store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type QaResult<T> = Result<T, QaError>;
