//! FILENAME: core/subtotal-engine/src/aggregate.rs
//! Aggregation runner: group-by over key columns, one reducer per step.
//!
//! Groups are formed by value equality of the key tuple and emitted in
//! order of first occurrence. The runner only partitions rows and
//! dispatches reducers; reducer semantics live in `accumulator` (built-ins)
//! or in the caller's closures (custom reducers).

use std::borrow::Cow;
use std::collections::hash_map::Entry;

use dataset::{ColumnId, DataType, KeyValue, Row, Schema, Table, Value};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::accumulator::AggregateAccumulator;
use crate::definition::{AggregationStep, InputRef, Reducer, RowExpr};
use crate::error::{ReducerError, SubtotalError, SubtotalResult};

/// Key tuple of one group.
type GroupKey = SmallVec<[KeyValue; 4]>;

/// Where a resolved step reads its values from.
#[derive(Debug, Clone)]
pub enum ResolvedInput<'a> {
    Column(ColumnId),
    Expression {
        columns: Vec<ColumnId>,
        expr: &'a RowExpr,
    },
}

/// An aggregation step whose input columns have been resolved against the source schema.
#[derive(Debug, Clone)]
pub struct ResolvedStep<'a> {
    pub step: &'a AggregationStep,
    pub input: ResolvedInput<'a>,
}

impl<'a> ResolvedStep<'a> {
    /// Resolves the step's input columns against `schema`.
    pub fn resolve(step: &'a AggregationStep, schema: &Schema) -> SubtotalResult<Self> {
        let lookup = |name: &str| {
            schema
                .resolve(name)
                .map_err(|_| SubtotalError::UnknownColumn(name.to_string()))
        };
        let input = match &step.input {
            InputRef::Column(name) => ResolvedInput::Column(lookup(name.as_str())?),
            InputRef::Expression(expr) => ResolvedInput::Expression {
                columns: expr
                    .columns
                    .iter()
                    .map(|name| lookup(name.as_str()))
                    .collect::<SubtotalResult<Vec<_>>>()?,
                expr,
            },
        };
        Ok(ResolvedStep { step, input })
    }

    /// Input value of this step for one row.
    fn input_value<'r>(&self, row: &'r Row) -> Cow<'r, Value> {
        match &self.input {
            ResolvedInput::Column(id) => Cow::Borrowed(&row[id.index()]),
            ResolvedInput::Expression { columns, expr } => {
                let args: SmallVec<[&Value; 4]> =
                    columns.iter().map(|id| &row[id.index()]).collect();
                Cow::Owned(expr.eval(&args))
            }
        }
    }

    /// Runs the step's reducer over the rows of one group.
    fn reduce(&self, rows: &[Row], members: &[usize]) -> SubtotalResult<Value> {
        let value = match &self.step.reducer {
            Reducer::Builtin(aggregation) => {
                let mut acc = AggregateAccumulator::new();
                for &i in members {
                    acc.add(&self.input_value(&rows[i]));
                }
                acc.compute(*aggregation)
            }
            Reducer::Custom(reducer) => {
                let inputs: Vec<Cow<'_, Value>> =
                    members.iter().map(|&i| self.input_value(&rows[i])).collect();
                let refs: Vec<&Value> = inputs.iter().map(|v| v.as_ref()).collect();
                reducer.reduce(&refs).map_err(|source| self.failed(source))?
            }
        };

        if !self.step.output_type.admits(&value) {
            return Err(self.failed(ReducerError::TypeMismatch {
                expected: self.step.output_type,
                actual: DataType::of(&value),
            }));
        }
        Ok(value)
    }

    fn failed(&self, source: ReducerError) -> SubtotalError {
        SubtotalError::Aggregation {
            output_column: self.step.output_column.clone(),
            source,
        }
    }
}

/// Groups `table` by `keys` and computes one output row per group:
/// the key values followed by one value per step.
pub fn aggregate(
    table: &Table,
    keys: &[ColumnId],
    steps: &[ResolvedStep<'_>],
    output_schema: &Schema,
) -> SubtotalResult<Table> {
    let rows = table.rows();

    let mut index: FxHashMap<GroupKey, usize> = FxHashMap::default();
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let key: GroupKey = keys.iter().map(|k| KeyValue::from(&row[k.index()])).collect();
        match index.entry(key) {
            Entry::Occupied(e) => groups[*e.get()].push(i),
            Entry::Vacant(e) => {
                e.insert(groups.len());
                groups.push(vec![i]);
            }
        }
    }

    let mut output = Vec::with_capacity(groups.len());
    for members in &groups {
        let first = &rows[members[0]];
        let mut out_row: Row = Vec::with_capacity(keys.len() + steps.len());
        out_row.extend(keys.iter().map(|k| first[k.index()].clone()));
        for step in steps {
            out_row.push(step.reduce(rows, members)?);
        }
        output.push(out_row);
    }

    Ok(Table::from_trusted_rows(output_schema.clone(), output))
}
