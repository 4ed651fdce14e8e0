//! FILENAME: tests/test_subtotals.rs
//! Integration tests for subtotal runs.

mod common;

use common::{rounded_rows, rows, CitiesFixture, SalesFixture};
use dataset::{DataType, Value};
use pretty_assertions::assert_eq;
use subtotal_engine::{
    aggregate_with_subtotals, run_subtotals, AggregationStep, AggregationType, EngineOptions,
    ErrorKind, KeyColumnIssue, RowExpr, SubtotalError, SubtotalRequest, SubtotalSpec,
};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn canada_and_west() -> Vec<SubtotalSpec> {
    vec![
        SubtotalSpec::grand_total("Province", "Canada"),
        SubtotalSpec::subtotal("Province", "West", ["BC", "AB", "SK", "MB"]),
    ]
}

fn cities_and_average() -> Vec<AggregationStep> {
    vec![
        AggregationStep::builtin("cities", "City", AggregationType::Count),
        AggregationStep::builtin("avgPop", "Pop", AggregationType::Average),
    ]
}

// ============================================================================
// END-TO-END
// ============================================================================

#[test]
fn test_totals_then_group_by() {
    let request = SubtotalRequest::new(["Province"], canada_and_west(), cities_and_average());
    let output = run_subtotals(&CitiesFixture::table(), &request).unwrap();

    assert_eq!(output.table.schema().names(), vec!["Province", "cities", "avgPop"]);
    assert_eq!(
        rounded_rows(&output.table, 3),
        rows(&[
            &["Canada", "5.000", "1.506"],
            &["West", "2.000", "1.085"],
            &["ON", "2.000", "1.830"],
            &["QC", "1.000", "1.700"],
            &["AB", "2.000", "1.085"],
        ])
    );
    assert_eq!(output.stats.combinations, 2);
    assert_eq!(output.stats.combined_rows, 7);
    assert_eq!(output.stats.combination_groups, 2);
    assert_eq!(output.stats.base_groups, Some(3));
}

#[test]
fn test_totals_only() {
    let table = aggregate_with_subtotals(
        &CitiesFixture::table(),
        &["Province"],
        canada_and_west(),
        cities_and_average(),
        Some(&["Province"][..]),
    )
    .unwrap();

    assert_eq!(
        rounded_rows(&table, 3),
        rows(&[&["Canada", "5.000", "1.506"], &["West", "2.000", "1.085"]])
    );
}

#[test]
fn test_empty_intersection_contributes_nothing() {
    let specs = vec![
        SubtotalSpec::grand_total("Province", "Canada"),
        SubtotalSpec::subtotal("Province", "Pacific", ["BC"]),
    ];
    let request = SubtotalRequest::new(["Province"], specs, cities_and_average());
    let output = run_subtotals(&CitiesFixture::table(), &request).unwrap();

    assert_eq!(output.stats.combinations, 2);
    assert_eq!(
        rounded_rows(&output.table, 3),
        rows(&[
            &["Canada", "5.000", "1.506"],
            &["ON", "2.000", "1.830"],
            &["QC", "1.000", "1.700"],
            &["AB", "2.000", "1.085"],
        ])
    );
}

#[test]
fn test_total_named_like_a_key_value_stays_separate() {
    // The total over {AB} is labelled "AB", the same tuple the plain group-by yields.
    let specs = vec![SubtotalSpec::subtotal("Province", "AB", ["AB"])];
    let request = SubtotalRequest::new(["Province"], specs, cities_and_average());
    let output = run_subtotals(&CitiesFixture::table(), &request).unwrap();

    assert_eq!(
        rounded_rows(&output.table, 3),
        rows(&[
            &["AB", "2.000", "1.085"],
            &["ON", "2.000", "1.830"],
            &["QC", "1.000", "1.700"],
            &["AB", "2.000", "1.085"],
        ])
    );
    assert_eq!(output.stats.combination_groups, 1);
    assert_eq!(output.stats.base_groups, Some(3));
}

#[test]
fn test_excluding_selector() {
    let specs = vec![SubtotalSpec::excluding("Province", "Outside Ontario", ["ON"])];
    let table = aggregate_with_subtotals(
        &CitiesFixture::table(),
        &["Province"],
        specs,
        cities_and_average(),
        Some(&["Province"][..]),
    )
    .unwrap();

    // Montreal, Calgary, Edmonton
    assert_eq!(rounded_rows(&table, 2), rows(&[&["Outside Ontario", "3.00", "1.29"]]));
}

#[test]
fn test_sentinel_grand_total_matches_plain_group_by() {
    let source = SalesFixture::table();
    let sum_sales = || vec![AggregationStep::builtin("Total", "Sales", AggregationType::Sum)];

    let totalled = aggregate_with_subtotals(
        &source,
        &["Region", "Product"],
        vec![SubtotalSpec::grand_total("Region", "<all>")],
        sum_sales(),
        Some(&["Region"][..]),
    )
    .unwrap();
    let plain = aggregate_with_subtotals(&source, &["Product"], Vec::new(), sum_sales(), None).unwrap();

    let expected: Vec<Vec<Value>> = plain
        .rows()
        .iter()
        .map(|row| {
            let mut with_region = vec![Value::text("<all>")];
            with_region.extend(row.iter().cloned());
            with_region
        })
        .collect();
    assert_eq!(totalled.rows(), expected.as_slice());
}

#[test]
fn test_two_columns_with_totals_only_on_one() {
    let specs = vec![
        SubtotalSpec::grand_total("Region", "All regions"),
        SubtotalSpec::grand_total("Quarter", "Full year"),
    ];
    let request = SubtotalRequest::new(
        ["Region", "Quarter"],
        specs,
        vec![AggregationStep::builtin("Total", "Sales", AggregationType::Sum)],
    )
    .with_totals_only(["Quarter"]);
    let output = run_subtotals(&SalesFixture::table(), &request).unwrap();

    // {Quarter} then {Region, Quarter}
    assert_eq!(output.stats.combinations, 2);
    assert_eq!(
        rounded_rows(&output.table, 0),
        rows(&[
            &["North", "Full year", "39000"],
            &["South", "Full year", "53000"],
            &["East", "Full year", "35500"],
            &["All regions", "Full year", "127500"],
        ])
    );
    // Text aliases in a number column
    let types: Vec<DataType> = output.table.schema().columns().iter().map(|c| c.data_type).collect();
    assert_eq!(types, vec![DataType::Text, DataType::Any, DataType::Number]);
}

#[test]
fn test_expression_and_custom_reducer() {
    let spread = AggregationStep::custom("Spread", "Pop", DataType::Number, |values| {
        let numbers: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
        let max = numbers.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let min = numbers.iter().cloned().fold(f64::INFINITY, f64::min);
        Ok(if numbers.is_empty() { Value::Empty } else { Value::Number(max - min) })
    });
    let thousands = AggregationStep::builtin("PopK", "Pop", AggregationType::Sum).with_expression(
        RowExpr::new(vec!["Pop".to_string()], |args| match args[0].as_f64() {
            Some(n) => Value::Number(n * 1000.0),
            None => Value::Empty,
        }),
    );

    let table = aggregate_with_subtotals(
        &CitiesFixture::table(),
        &["Province"],
        vec![SubtotalSpec::grand_total("Province", "Canada")],
        vec![spread, thousands],
        Some(&["Province"][..]),
    )
    .unwrap();

    assert_eq!(rounded_rows(&table, 2), rows(&[&["Canada", "1.80", "7530.00"]]));
}

#[test]
fn test_request_from_json() {
    let json = r#"{
        "key_columns": ["Province"],
        "subtotals": [
            {"column": "Province", "alias": "Canada", "selector": "All"},
            {"column": "Province", "alias": "West", "selector": {"In": [{"Text": "BC"}, {"Text": "AB"}]}}
        ],
        "aggregated_columns": [
            {"output_column": "cities", "input": {"Column": "City"}, "reducer": {"Builtin": "Count"}, "output_type": "Number"}
        ],
        "totals_only": ["Province"],
        "options": {"max_combinations": 10}
    }"#;
    let request: SubtotalRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.options, EngineOptions::default().with_max_combinations(10));

    let output = run_subtotals(&CitiesFixture::table(), &request).unwrap();
    assert_eq!(rounded_rows(&output.table, 0), rows(&[&["Canada", "5"], &["West", "2"]]));
}

// ============================================================================
// ERRORS
// ============================================================================

#[test]
fn test_parameter_errors() {
    let source = CitiesFixture::table();

    let err = aggregate_with_subtotals(&source, &[], canada_and_west(), cities_and_average(), None)
        .unwrap_err();
    assert_eq!(err, SubtotalError::InvalidKeyColumns(KeyColumnIssue::Empty));

    let err = aggregate_with_subtotals(&source, &["City"], canada_and_west(), cities_and_average(), None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidKeyColumns);

    let mut specs = canada_and_west();
    specs.push(SubtotalSpec::subtotal("Province", "Canada", ["ON"]));
    let err = aggregate_with_subtotals(&source, &["Province"], specs, cities_and_average(), None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateAlias);

    let err = aggregate_with_subtotals(
        &source,
        &["Province", "City"],
        canada_and_west(),
        cities_and_average(),
        Some(&["City"][..]),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTotalsOnly);
    assert!(err.to_string().contains("City"));

    let err = aggregate_with_subtotals(&source, &["Country"], Vec::new(), cities_and_average(), None)
        .unwrap_err();
    assert_eq!(err, SubtotalError::UnknownColumn("Country".to_string()));

    let mut count_as_text = AggregationStep::builtin("cities", "City", AggregationType::Count);
    count_as_text.output_type = DataType::Text;
    let err = aggregate_with_subtotals(&source, &["Province"], canada_and_west(), vec![count_as_text], None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOutputType);

    for kind in [ErrorKind::InvalidKeyColumns, ErrorKind::DuplicateAlias, ErrorKind::InvalidTotalsOnly] {
        assert!(kind.is_parameter_error());
    }
}

#[test]
fn test_combination_ceiling_from_json_options() {
    let options = EngineOptions::from_json(r#"{"max_combinations": 1}"#).unwrap();
    let request = SubtotalRequest::new(["Province"], canada_and_west(), cities_and_average())
        .with_options(options);

    assert_eq!(
        run_subtotals(&CitiesFixture::table(), &request).unwrap_err(),
        SubtotalError::CombinationLimitExceeded { planned: 2, limit: 1 }
    );
}

#[test]
fn test_reducer_failure_aborts_run() {
    let failing = AggregationStep::custom("Median", "Pop", DataType::Number, |_| {
        Err(subtotal_engine::ReducerError::Failed("median is not supported".to_string()))
    });
    let err = aggregate_with_subtotals(
        &CitiesFixture::table(),
        &["Province"],
        canada_and_west(),
        vec![failing],
        None,
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Aggregation);
    assert_eq!(err.to_string(), "aggregation of 'Median' failed: median is not supported");
}
