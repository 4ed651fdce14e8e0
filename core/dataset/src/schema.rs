//! FILENAME: core/dataset/src/schema.rs
//! PURPOSE: Column definitions for a table.
//! CONTEXT: A `Schema` is fixed for a table's lifetime. Column names are
//! resolved to a `ColumnId` once; rows are then read positionally.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DatasetError;
use crate::value::DataType;

/// Validated position of a column within a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnId(pub usize);

impl ColumnId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Describes one column of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column header.
    pub name: String,

    /// Declared type. Values pushed into the column must be admitted by it.
    pub data_type: DataType,

    /// Free-form description, informational only.
    #[serde(default)]
    pub description: Option<String>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        ColumnDef {
            name: name.into(),
            data_type,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Ordered, duplicate-free list of column definitions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<ColumnDef>", into = "Vec<ColumnDef>")]
pub struct Schema {
    columns: Vec<ColumnDef>,
}

impl Schema {
    /// Creates a schema, rejecting duplicate column names.
    pub fn new(columns: Vec<ColumnDef>) -> Result<Self, DatasetError> {
        for (i, col) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == col.name) {
                return Err(DatasetError::DuplicateColumn(col.name.clone()));
            }
        }
        Ok(Schema { columns })
    }

    /// Resolves a column name to its id.
    pub fn resolve(&self, name: &str) -> Result<ColumnId, DatasetError> {
        self.position(name)
            .map(ColumnId)
            .ok_or_else(|| DatasetError::UnknownColumn(name.to_string()))
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, id: ColumnId) -> &ColumnDef {
        &self.columns[id.0]
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Map of column name to declared type.
    pub fn dtype_mapping(&self) -> BTreeMap<String, DataType> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.data_type))
            .collect()
    }

    /// Builds a schema from a subset of this schema's columns, in the given order.
    pub fn project(&self, ids: &[ColumnId]) -> Result<Schema, DatasetError> {
        Schema::new(ids.iter().map(|&id| self.column(id).clone()).collect())
    }

    /// Returns a schema with `extra` appended after this schema's columns.
    pub fn extend(&self, extra: Vec<ColumnDef>) -> Result<Schema, DatasetError> {
        let mut columns = self.columns.clone();
        columns.extend(extra);
        Schema::new(columns)
    }
}

impl TryFrom<Vec<ColumnDef>> for Schema {
    type Error = DatasetError;

    fn try_from(columns: Vec<ColumnDef>) -> Result<Self, Self::Error> {
        Schema::new(columns)
    }
}

impl From<Schema> for Vec<ColumnDef> {
    fn from(schema: Schema) -> Self {
        schema.columns
    }
}
