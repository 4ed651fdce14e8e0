//! FILENAME: core/dataset/src/error.rs

use thiserror::Error;

use crate::value::DataType;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatasetError {
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("row {row} has {actual} values, expected {expected}")]
    ArityMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("row {row}: value in column {column} is not of type {expected}")]
    TypeMismatch {
        row: usize,
        column: String,
        expected: DataType,
    },

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
}
