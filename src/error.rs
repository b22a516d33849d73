//! Error types for MRC I/O and mask encoding

use crate::types::DataType;
use thiserror::Error;

/// Main error type for mrcstack operations
#[derive(Error, Debug)]
pub enum MrcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported datatype code: {0}")]
    UnsupportedDatatype(i32),

    #[error("corrupt header: {0}")]
    CorruptHeader(String),

    #[error("datatype mismatch: file stores {stored}, requested {requested}")]
    DatatypeMismatch {
        stored: DataType,
        requested: DataType,
    },

    #[error("incomplete section: {0}")]
    IncompleteSection(String),

    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("invalid prime key: {0}")]
    InvalidPrimeKey(u64),

    #[error("encoding overflow: {0}")]
    EncodingOverflow(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Specialized Result type for mrcstack operations
pub type Result<T> = std::result::Result<T, MrcError>;

impl From<bincode::Error> for MrcError {
    fn from(err: bincode::Error) -> Self {
        MrcError::Serialization(err.to_string())
    }
}
