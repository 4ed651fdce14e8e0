//! FILENAME: core/subtotal-engine/src/aggregator.rs
//! Incremental front end: collect group columns, totals and measures one
//! call at a time, then aggregate.
//!
//! Each column has at most one grand total and any number of subtotals.
//! Aliases are unique across grand totals, subtotals and measures.
//! Grand and sub totals add their column to the group-by columns.

use std::fmt;

use dataset::{Table, Value};
use log::info;

use crate::definition::{AggregationStep, AggregationType, Selector, SubtotalRequest, SubtotalSpec};
use crate::engine::{run_subtotals, SubtotalOutput};
use crate::error::{SubtotalError, SubtotalResult};
use crate::options::EngineOptions;

#[derive(Debug, Clone)]
pub struct SubtotalAggregator {
    name: String,
    table: Option<Table>,
    group_columns: Vec<String>,
    grand_totals: Vec<SubtotalSpec>,
    subtotals: Vec<SubtotalSpec>,
    measures: Vec<AggregationStep>,
    options: EngineOptions,
}

impl SubtotalAggregator {
    pub fn new(name: impl Into<String>) -> Self {
        SubtotalAggregator {
            name: name.into(),
            table: None,
            group_columns: Vec::new(),
            grand_totals: Vec::new(),
            subtotals: Vec::new(),
            measures: Vec::new(),
            options: EngineOptions::default(),
        }
    }

    pub fn with_table(mut self, table: Table) -> SubtotalResult<Self> {
        self.set_table(table)?;
        Ok(self)
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn group_columns(&self) -> &[String] {
        &self.group_columns
    }

    /// Sets the table to aggregate. Every column configured so far must exist in it.
    pub fn set_table(&mut self, table: Table) -> SubtotalResult<()> {
        let configured = self
            .group_columns
            .iter()
            .map(String::as_str)
            .chain(self.measures.iter().flat_map(|m| m.input.columns()));
        for col in configured {
            if !table.schema().contains(col) {
                return Err(SubtotalError::ColumnNotInTable(col.to_string()));
            }
        }
        self.table = Some(table);
        Ok(())
    }

    /// Groups by `column` without totalling it. Adding a column twice has no effect.
    pub fn add_groupby_column(&mut self, column: impl Into<String>) -> SubtotalResult<()> {
        let column = column.into();
        self.check_column(&column)?;
        if !self.group_columns.contains(&column) {
            self.group_columns.push(column);
        }
        Ok(())
    }

    pub fn add_grand_total(
        &mut self,
        column: impl Into<String>,
        alias: impl Into<String>,
    ) -> SubtotalResult<()> {
        let column = column.into();
        let alias = alias.into();
        self.add_groupby_column(column.clone())?;
        if self.grand_totals.iter().any(|g| g.column == column) {
            return Err(SubtotalError::GrandTotalExists(column));
        }
        self.check_alias(&alias)?;
        self.grand_totals.push(SubtotalSpec::grand_total(column, alias));
        Ok(())
    }

    /// Totals the rows whose `column` value is in `values` (`include`) or
    /// not in `values` (`!include`).
    pub fn add_subtotal<V: Into<Value>>(
        &mut self,
        column: impl Into<String>,
        alias: impl Into<String>,
        values: impl IntoIterator<Item = V>,
        include: bool,
    ) -> SubtotalResult<()> {
        let column = column.into();
        let alias = alias.into();
        self.add_groupby_column(column.clone())?;
        self.check_alias(&alias)?;

        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let selector = if include {
            Selector::In(values)
        } else {
            Selector::NotIn(values)
        };
        self.subtotals.push(SubtotalSpec::new(column, alias, selector));
        Ok(())
    }

    /// Computes `aggregation` over `column` into an output column named `alias`.
    /// The column does not need to be a group column.
    pub fn add_measure(
        &mut self,
        column: impl Into<String>,
        alias: impl Into<String>,
        aggregation: AggregationType,
    ) -> SubtotalResult<()> {
        self.add_step(AggregationStep::builtin(alias, column, aggregation))
    }

    /// Adds a fully specified measure, e.g. one with a custom reducer.
    pub fn add_step(&mut self, step: AggregationStep) -> SubtotalResult<()> {
        for col in step.input.columns() {
            self.check_column(col)?;
        }
        self.check_alias(&step.output_column)?;
        self.measures.push(step);
        Ok(())
    }

    /// The request `aggregate` would run. Grand totals come before subtotals.
    pub fn request(&self, totals_only: Option<&[&str]>) -> SubtotalRequest {
        let subtotals = self
            .grand_totals
            .iter()
            .chain(self.subtotals.iter())
            .cloned()
            .collect();
        let mut request =
            SubtotalRequest::new(self.group_columns.iter().cloned(), subtotals, self.measures.clone())
                .with_options(self.options.clone());
        if let Some(cols) = totals_only {
            request = request.with_totals_only(cols.iter().copied());
        }
        request
    }

    /// Runs every configured aggregation and returns them as one table.
    pub fn aggregate(&self, totals_only: Option<&[&str]>) -> SubtotalResult<Table> {
        Ok(self.aggregate_with_stats(totals_only)?.table)
    }

    pub fn aggregate_with_stats(&self, totals_only: Option<&[&str]>) -> SubtotalResult<SubtotalOutput> {
        let table = self.ready()?;
        info!(target: "subtotal", "aggregate start: {}", self);
        let output = run_subtotals(table, &self.request(totals_only))?;
        info!(target: "subtotal", "aggregate end: {}", self);
        Ok(output)
    }

    fn ready(&self) -> SubtotalResult<&Table> {
        let table = self.table.as_ref().ok_or(SubtotalError::NoTable)?;
        if self.group_columns.is_empty() {
            return Err(SubtotalError::NoGroupColumns(self.to_string()));
        }
        if self.measures.is_empty() {
            return Err(SubtotalError::NoMeasures(self.to_string()));
        }
        Ok(table)
    }

    fn check_column(&self, column: &str) -> SubtotalResult<()> {
        match &self.table {
            Some(table) if !table.schema().contains(column) => {
                Err(SubtotalError::ColumnNotInTable(column.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn check_alias(&self, alias: &str) -> SubtotalResult<()> {
        let in_use = self
            .grand_totals
            .iter()
            .chain(self.subtotals.iter())
            .any(|s| s.alias == alias)
            || self.measures.iter().any(|m| m.output_column == alias);
        if in_use {
            Err(SubtotalError::AliasInUse(alias.to_string()))
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for SubtotalAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SubtotalAggregator ({}) with: {} grand totals, {} sub totals, {} measures",
            self.name,
            self.grand_totals.len(),
            self.subtotals.len(),
            self.measures.len()
        )
    }
}
