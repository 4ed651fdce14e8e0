//! FILENAME: core/subtotal-engine/src/error.rs

use std::fmt;

use dataset::{DataType, DatasetError};
use thiserror::Error;

/// Machine-checkable category of a `SubtotalError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidKeyColumns,
    DuplicateAlias,
    InvalidTotalsOnly,
    UnknownColumn,
    DuplicateOutputColumn,
    InvalidOutputType,
    CombinationLimitExceeded,
    InvalidOptions,
    Aggregation,
    Dataset,
    Configuration,
}

impl ErrorKind {
    /// True for errors raised while validating call parameters,
    /// before any transformation or aggregation has run.
    pub fn is_parameter_error(self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidKeyColumns
                | ErrorKind::DuplicateAlias
                | ErrorKind::InvalidTotalsOnly
                | ErrorKind::UnknownColumn
                | ErrorKind::DuplicateOutputColumn
                | ErrorKind::InvalidOutputType
        )
    }
}

/// What is wrong with the requested key columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyColumnIssue {
    /// No key columns were given.
    Empty,
    /// Subtotal columns that are not key columns.
    NotInKeys(Vec<String>),
    /// Key columns listed more than once.
    Duplicated(Vec<String>),
}

impl fmt::Display for KeyColumnIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyColumnIssue::Empty => write!(f, "no key columns given"),
            KeyColumnIssue::NotInKeys(cols) => {
                write!(f, "subtotal columns not in key columns: {}", cols.join(", "))
            }
            KeyColumnIssue::Duplicated(cols) => {
                write!(f, "key columns listed more than once: {}", cols.join(", "))
            }
        }
    }
}

/// Failure raised by a reducer while computing one aggregate value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReducerError {
    #[error("{0}")]
    Failed(String),

    #[error("reducer produced a {actual} value, declared output type is {expected}")]
    TypeMismatch { expected: DataType, actual: DataType },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubtotalError {
    #[error("invalid key columns: {0}")]
    InvalidKeyColumns(KeyColumnIssue),

    #[error("alias '{alias}' is used more than once for column {column}")]
    DuplicateAlias { column: String, alias: String },

    #[error("totals-only columns [{}] have no subtotal set, expected one of [{}]", .columns.join(", "), .expected.join(", "))]
    InvalidTotalsOnly {
        columns: Vec<String>,
        expected: Vec<String>,
    },

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("output column '{0}' is declared more than once")]
    DuplicateOutputColumn(String),

    #[error("output column '{output_column}' is declared {declared}, built-in aggregations produce numbers")]
    InvalidOutputType {
        output_column: String,
        declared: DataType,
    },

    #[error("{planned} subtotal combinations planned, limit is {limit}")]
    CombinationLimitExceeded { planned: usize, limit: usize },

    #[error("invalid engine options: {0}")]
    InvalidOptions(String),

    #[error("aggregation of '{output_column}' failed: {source}")]
    Aggregation {
        output_column: String,
        #[source]
        source: ReducerError,
    },

    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("column '{0}' is not part of the table")]
    ColumnNotInTable(String),

    #[error("alias '{0}' already in use")]
    AliasInUse(String),

    #[error("column '{0}' already has a grand total")]
    GrandTotalExists(String),

    #[error("no table has been set")]
    NoTable,

    #[error("{0} has no group-by columns")]
    NoGroupColumns(String),

    #[error("{0} has no measures to calculate")]
    NoMeasures(String),
}

impl SubtotalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SubtotalError::InvalidKeyColumns(_) => ErrorKind::InvalidKeyColumns,
            SubtotalError::DuplicateAlias { .. } => ErrorKind::DuplicateAlias,
            SubtotalError::InvalidTotalsOnly { .. } => ErrorKind::InvalidTotalsOnly,
            SubtotalError::UnknownColumn(_) => ErrorKind::UnknownColumn,
            SubtotalError::DuplicateOutputColumn(_) => ErrorKind::DuplicateOutputColumn,
            SubtotalError::InvalidOutputType { .. } => ErrorKind::InvalidOutputType,
            SubtotalError::CombinationLimitExceeded { .. } => ErrorKind::CombinationLimitExceeded,
            SubtotalError::InvalidOptions(_) => ErrorKind::InvalidOptions,
            SubtotalError::Aggregation { .. } => ErrorKind::Aggregation,
            SubtotalError::Dataset(_) => ErrorKind::Dataset,
            SubtotalError::ColumnNotInTable(_)
            | SubtotalError::AliasInUse(_)
            | SubtotalError::GrandTotalExists(_)
            | SubtotalError::NoTable
            | SubtotalError::NoGroupColumns(_)
            | SubtotalError::NoMeasures(_) => ErrorKind::Configuration,
        }
    }
}

pub type SubtotalResult<T> = Result<T, SubtotalError>;
