//! FILENAME: core/dataset/src/lib.rs
//! PURPOSE: Shared tabular data types.
//! CONTEXT: Re-exports the value, schema and table types used by the
//! subtotal engine. Holds no aggregation logic of its own.

pub mod error;
pub mod schema;
pub mod table;
pub mod value;

pub use error::DatasetError;
pub use schema::{ColumnDef, ColumnId, Schema};
pub use table::{Row, Table};
pub use value::{DataType, KeyValue, OrderedFloat, Value};
