//! FILENAME: core/dataset/src/table.rs
//! PURPOSE: Fully materialized, row-oriented table.
//! CONTEXT: Rows are `Vec<Value>` aligned with the schema. Arity and
//! declared types are checked when rows enter the table, so readers can
//! index by `ColumnId` without re-checking.

use serde::{Deserialize, Serialize};

use crate::error::DatasetError;
use crate::schema::{ColumnId, Schema};
use crate::value::Value;

/// One row of values, positionally aligned with the owning table's schema.
pub type Row = Vec<Value>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    schema: Schema,
    rows: Vec<Row>,
}

impl Table {
    /// Creates an empty table.
    pub fn new(schema: Schema) -> Self {
        Table {
            schema,
            rows: Vec::new(),
        }
    }

    /// Creates a table from rows, validating each one against the schema.
    pub fn from_rows<I>(schema: Schema, rows: I) -> Result<Self, DatasetError>
    where
        I: IntoIterator<Item = Row>,
    {
        let mut table = Table::new(schema);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Creates a table from rows that are already known to match the schema.
    /// Used internally by transforms that only copy or relabel validated rows.
    pub fn from_trusted_rows(schema: Schema, rows: Vec<Row>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == schema.len()));
        Table { schema, rows }
    }

    /// Appends a row after checking arity and declared types.
    pub fn push_row(&mut self, row: Row) -> Result<(), DatasetError> {
        let row_index = self.rows.len();
        if row.len() != self.schema.len() {
            return Err(DatasetError::ArityMismatch {
                row: row_index,
                expected: self.schema.len(),
                actual: row.len(),
            });
        }

        for (def, value) in self.schema.columns().iter().zip(row.iter()) {
            if !def.data_type.admits(value) {
                return Err(DatasetError::TypeMismatch {
                    row: row_index,
                    column: def.name.clone(),
                    expected: def.data_type,
                });
            }
        }

        self.rows.push(row);
        Ok(())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Gets the value at a row/column position.
    pub fn value(&self, row: usize, column: ColumnId) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column.index()))
    }

    /// Looks up a value by column name. Prefer `value` in loops.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let id = self.schema.resolve(column).ok()?;
        self.value(row, id)
    }

    /// Iterates over every value of one column.
    pub fn column_values(&self, column: ColumnId) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |r| &r[column.index()])
    }

    /// Appends the rows of another table with the same column names.
    pub fn concat(&mut self, other: Table) -> Result<(), DatasetError> {
        if self.schema.names() != other.schema.names() {
            return Err(DatasetError::SchemaMismatch(format!(
                "cannot append [{}] to [{}]",
                other.schema.names().join(", "),
                self.schema.names().join(", ")
            )));
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    /// Renders the table as tab-separated text, one line per row, header first.
    pub fn to_tsv(&self) -> String {
        let mut out = self.schema.names().join("\t");
        for row in &self.rows {
            out.push('\n');
            let cells: Vec<String> = row.iter().map(Value::display_value).collect();
            out.push_str(&cells.join("\t"));
        }
        out
    }
}
