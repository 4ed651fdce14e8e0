//! FILENAME: core/subtotal-engine/src/transform.rs
//! View transform: applies one combination of subtotals to the source rows.
//!
//! Each specification keeps only the rows its selector matches and writes
//! its alias over its column in those rows. Specifications run in
//! combination order, each on the output of the previous one. A
//! combination can therefore produce an empty view; that is not an error.

use dataset::{ColumnId, Row, Schema, Table, Value};

use crate::definition::{SubtotalSpec, TotalColumn};

/// A subtotal specification whose column has been resolved against the source schema.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedSpec<'a> {
    pub spec: &'a SubtotalSpec,
    pub column: ColumnId,
}

impl ResolvedSpec<'_> {
    fn selects(&self, row: &Row) -> bool {
        self.spec.selector.matches(&row[self.column.index()])
    }
}

impl TotalColumn for ResolvedSpec<'_> {
    fn total_column(&self) -> &str {
        &self.spec.column
    }
}

/// Produces the transformed view of `source` for one combination.
/// `view_schema` is the source schema widened to hold alias labels.
pub fn apply_combination(
    combination: &[ResolvedSpec<'_>],
    source: &Table,
    view_schema: &Schema,
) -> Table {
    Table::from_trusted_rows(view_schema.clone(), relabel_rows(combination, source.rows()))
}

/// Row-level part of `apply_combination`.
pub fn relabel_rows(combination: &[ResolvedSpec<'_>], source: &[Row]) -> Vec<Row> {
    let Some((first, rest)) = combination.split_first() else {
        return source.to_vec();
    };

    // Only rows selected by the first specification are ever copied.
    let first_alias = first.spec.alias_value();
    let mut rows: Vec<Row> = source
        .iter()
        .filter(|row| first.selects(row))
        .map(|row| {
            let mut row = row.clone();
            row[first.column.index()] = first_alias.clone();
            row
        })
        .collect();

    for spec in rest {
        rows.retain(|row| spec.selects(row));
        let alias: Value = spec.spec.alias_value();
        for row in rows.iter_mut() {
            row[spec.column.index()] = alias.clone();
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataset::{ColumnDef, DataType};

    fn source() -> Table {
        let schema = Schema::new(vec![
            ColumnDef::new("City", DataType::Text),
            ColumnDef::new("Province", DataType::Text),
            ColumnDef::new("Pop", DataType::Number),
        ])
        .unwrap();
        Table::from_rows(
            schema,
            vec![
                vec![Value::text("Toronto"), Value::text("ON"), Value::Number(2.73)],
                vec![Value::text("Calgary"), Value::text("AB"), Value::Number(1.24)],
                vec![Value::text("Edmonton"), Value::text("AB"), Value::Number(0.93)],
            ],
        )
        .unwrap()
    }

    fn column_text(table: &Table, column: usize) -> Vec<String> {
        table
            .column_values(ColumnId(column))
            .map(Value::display_value)
            .collect()
    }

    #[test]
    fn test_grand_total_relabels_every_row() {
        let table = source();
        let canada = SubtotalSpec::grand_total("Province", "Canada");
        let combo = [ResolvedSpec { spec: &canada, column: ColumnId(1) }];

        let view = apply_combination(&combo, &table, table.schema());
        assert_eq!(column_text(&view, 1), vec!["Canada", "Canada", "Canada"]);
        assert_eq!(column_text(&view, 0), vec!["Toronto", "Calgary", "Edmonton"]);
    }

    #[test]
    fn test_subtotal_drops_unselected_rows() {
        let table = source();
        let west = SubtotalSpec::subtotal("Province", "West", ["BC", "AB", "SK", "MB"]);
        let combo = [ResolvedSpec { spec: &west, column: ColumnId(1) }];

        let view = apply_combination(&combo, &table, table.schema());
        assert_eq!(column_text(&view, 1), vec!["West", "West"]);
        assert_eq!(column_text(&view, 0), vec!["Calgary", "Edmonton"]);
    }

    #[test]
    fn test_specifications_apply_in_sequence() {
        let table = source();
        let west = SubtotalSpec::subtotal("Province", "West", ["AB"]);
        let big = SubtotalSpec::custom("City", "Big cities", |v| {
            v.as_str().map_or(false, |s| s != "Edmonton")
        });
        let combo = [
            ResolvedSpec { spec: &west, column: ColumnId(1) },
            ResolvedSpec { spec: &big, column: ColumnId(0) },
        ];

        let rows = relabel_rows(&combo, table.rows());
        assert_eq!(
            rows,
            vec![vec![Value::text("Big cities"), Value::text("West"), Value::Number(1.24)]]
        );
    }

    #[test]
    fn test_empty_intersection_yields_empty_view() {
        let table = source();
        let quebec = SubtotalSpec::subtotal("Province", "Quebec", ["QC"]);
        let combo = [ResolvedSpec { spec: &quebec, column: ColumnId(1) }];

        let view = apply_combination(&combo, &table, table.schema());
        assert!(view.is_empty());
        assert_eq!(view.schema(), table.schema());
    }

    #[test]
    fn test_source_is_untouched() {
        let table = source();
        let before = table.clone();
        let canada = SubtotalSpec::grand_total("Province", "Canada");
        let _ = relabel_rows(&[ResolvedSpec { spec: &canada, column: ColumnId(1) }], table.rows());
        assert_eq!(table, before);
    }
}
