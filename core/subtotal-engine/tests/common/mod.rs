//! FILENAME: tests/common/mod.rs
//! Fixtures and assertion helpers for subtotal-engine integration tests.

#![allow(dead_code)]

use dataset::{ColumnDef, DataType, Schema, Table, Value};

// ============================================================================
// FIXTURES
// ============================================================================

/// Canadian cities with population in millions.
pub struct CitiesFixture;

impl CitiesFixture {
    pub fn data() -> Vec<(&'static str, &'static str, f64)> {
        vec![
            ("Toronto", "ON", 2.73),
            ("Montreal", "QC", 1.70),
            ("Calgary", "AB", 1.24),
            ("Ottawa", "ON", 0.93),
            ("Edmonton", "AB", 0.93),
        ]
    }

    pub fn schema() -> Schema {
        Schema::new(vec![
            ColumnDef::new("City", DataType::Text),
            ColumnDef::new("Province", DataType::Text).with_description("Two-letter province code"),
            ColumnDef::new("Pop", DataType::Number).with_description("Population in millions"),
        ])
        .expect("cities schema")
    }

    pub fn table() -> Table {
        let rows = Self::data()
            .into_iter()
            .map(|(city, province, pop)| vec![Value::text(city), Value::text(province), Value::Number(pop)]);
        Table::from_rows(Self::schema(), rows).expect("cities table")
    }
}

/// Sales by region, product and quarter.
pub struct SalesFixture;

impl SalesFixture {
    pub fn data() -> Vec<(&'static str, &'static str, f64, f64)> {
        vec![
            ("North", "Widget", 1.0, 10000.0),
            ("North", "Widget", 2.0, 12000.0),
            ("North", "Gadget", 1.0, 8000.0),
            ("North", "Gadget", 2.0, 9000.0),
            ("South", "Widget", 1.0, 15000.0),
            ("South", "Widget", 2.0, 14000.0),
            ("South", "Gadget", 1.0, 11000.0),
            ("South", "Gadget", 2.0, 13000.0),
            ("East", "Widget", 1.0, 9000.0),
            ("East", "Widget", 2.0, 11000.0),
            ("East", "Gadget", 1.0, 7000.0),
            ("East", "Gadget", 2.0, 8500.0),
        ]
    }

    /// `Quarter` is a number column, so text aliases widen it.
    pub fn table() -> Table {
        let schema = Schema::new(vec![
            ColumnDef::new("Region", DataType::Text),
            ColumnDef::new("Product", DataType::Text),
            ColumnDef::new("Quarter", DataType::Number),
            ColumnDef::new("Sales", DataType::Number),
        ])
        .expect("sales schema");
        let rows = Self::data().into_iter().map(|(region, product, quarter, sales)| {
            vec![
                Value::text(region),
                Value::text(product),
                Value::Number(quarter),
                Value::Number(sales),
            ]
        });
        Table::from_rows(schema, rows).expect("sales table")
    }
}

// ============================================================================
// ASSERTION HELPERS
// ============================================================================

/// Rows of `table` as display strings, numbers rounded to `places`.
pub fn rounded_rows(table: &Table, places: i32) -> Vec<Vec<String>> {
    let scale = 10f64.powi(places);
    table
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|value| match value {
                    Value::Number(n) => format!("{:.*}", places as usize, (n * scale).round() / scale),
                    other => other.display_value(),
                })
                .collect()
        })
        .collect()
}

/// Builds expected rows from string literals.
pub fn rows(expected: &[&[&str]]) -> Vec<Vec<String>> {
    expected
        .iter()
        .map(|row| row.iter().map(|s| s.to_string()).collect())
        .collect()
}
