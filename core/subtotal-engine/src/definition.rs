//! FILENAME: core/subtotal-engine/src/definition.rs
//! Subtotal Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE a subtotal run:
//! which columns to group by, which grand/sub totals to produce and which
//! measures to compute. Everything here is serializable except the
//! closure-backed variants (custom selectors, expressions and reducers).

use std::fmt;
use std::sync::Arc;

use dataset::{DataType, Value};
use serde::{Deserialize, Serialize};

use crate::error::ReducerError;
use crate::options::EngineOptions;

// ============================================================================
// SELECTORS
// ============================================================================

/// Row predicate over a single column value.
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Chooses the rows a subtotal applies to.
#[derive(Clone, Serialize, Deserialize)]
pub enum Selector {
    /// Every row. A subtotal with this selector is a grand total.
    All,
    /// Rows whose value is one of these.
    In(Vec<Value>),
    /// Rows whose value is none of these.
    NotIn(Vec<Value>),
    /// Arbitrary predicate. Cannot be serialized.
    #[serde(skip)]
    Custom(Predicate),
}

impl Selector {
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Selector::Custom(Arc::new(predicate))
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Selector::All => true,
            Selector::In(values) => values.iter().any(|v| v.same_as(value)),
            Selector::NotIn(values) => !values.iter().any(|v| v.same_as(value)),
            Selector::Custom(predicate) => predicate(value),
        }
    }

    pub fn is_grand_total(&self) -> bool {
        matches!(self, Selector::All)
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::All => write!(f, "All"),
            Selector::In(values) => f.debug_tuple("In").field(values).finish(),
            Selector::NotIn(values) => f.debug_tuple("NotIn").field(values).finish(),
            Selector::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

// ============================================================================
// SUBTOTAL SPECIFICATION
// ============================================================================

/// Rows of `column` matching `selector` are relabelled `alias` and
/// aggregated together as one named total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtotalSpec {
    /// Key column the total is taken over.
    pub column: String,

    /// Label written into `column` for the selected rows.
    pub alias: String,

    pub selector: Selector,
}

impl SubtotalSpec {
    pub fn new(column: impl Into<String>, alias: impl Into<String>, selector: Selector) -> Self {
        SubtotalSpec {
            column: column.into(),
            alias: alias.into(),
            selector,
        }
    }

    /// A total over every value of the column.
    pub fn grand_total(column: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::new(column, alias, Selector::All)
    }

    /// A total over the listed values.
    pub fn subtotal<V: Into<Value>>(
        column: impl Into<String>,
        alias: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::new(column, alias, Selector::In(values.into_iter().map(Into::into).collect()))
    }

    /// A total over every value except the listed ones.
    pub fn excluding<V: Into<Value>>(
        column: impl Into<String>,
        alias: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::new(column, alias, Selector::NotIn(values.into_iter().map(Into::into).collect()))
    }

    pub fn custom<F>(column: impl Into<String>, alias: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::new(column, alias, Selector::custom(predicate))
    }

    /// The value written over selected rows.
    pub fn alias_value(&self) -> Value {
        Value::Text(self.alias.clone())
    }
}

/// Anything that names the column a total applies to.
pub trait TotalColumn {
    fn total_column(&self) -> &str;
}

impl TotalColumn for SubtotalSpec {
    fn total_column(&self) -> &str {
        &self.column
    }
}

impl<T: TotalColumn + ?Sized> TotalColumn for &T {
    fn total_column(&self) -> &str {
        (**self).total_column()
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Built-in reducers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationType {
    Sum,
    /// Non-empty values of any type.
    Count,
    Average,
    Min,
    Max,
    CountNumbers,
    StdDev,
    StdDevP,
    Var,
    VarP,
    Product,
}

impl Default for AggregationType {
    fn default() -> Self {
        AggregationType::Sum
    }
}

/// Computes a derived value from the values of `columns` in one row.
pub type ExprFn = Arc<dyn Fn(&[&Value]) -> Value + Send + Sync>;

/// A per-row expression over named input columns.
#[derive(Clone)]
pub struct RowExpr {
    pub columns: Vec<String>,
    func: ExprFn,
}

impl RowExpr {
    pub fn new<F>(columns: Vec<String>, func: F) -> Self
    where
        F: Fn(&[&Value]) -> Value + Send + Sync + 'static,
    {
        RowExpr {
            columns,
            func: Arc::new(func),
        }
    }

    pub fn eval(&self, args: &[&Value]) -> Value {
        (self.func)(args)
    }
}

impl fmt::Debug for RowExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowExpr").field("columns", &self.columns).finish_non_exhaustive()
    }
}

/// Where a measure reads its input values from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InputRef {
    Column(String),
    #[serde(skip)]
    Expression(RowExpr),
}

impl InputRef {
    /// Source columns this input reads.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            InputRef::Column(c) => vec![c.as_str()],
            InputRef::Expression(expr) => expr.columns.iter().map(String::as_str).collect(),
        }
    }
}

/// User-supplied reducer over one group's input values.
pub type ReduceFn = Arc<dyn Fn(&[&Value]) -> Result<Value, ReducerError> + Send + Sync>;

#[derive(Clone)]
pub struct CustomReducer {
    pub name: String,
    func: ReduceFn,
}

impl CustomReducer {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[&Value]) -> Result<Value, ReducerError> + Send + Sync + 'static,
    {
        CustomReducer {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn reduce(&self, values: &[&Value]) -> Result<Value, ReducerError> {
        (self.func)(values)
    }
}

impl fmt::Debug for CustomReducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomReducer").field("name", &self.name).finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Reducer {
    Builtin(AggregationType),
    #[serde(skip)]
    Custom(CustomReducer),
}

/// One output column of the aggregate: `reducer` applied to `input`
/// over every group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationStep {
    pub output_column: String,
    pub input: InputRef,
    pub reducer: Reducer,
    pub output_type: DataType,
}

impl AggregationStep {
    pub fn new(
        output_column: impl Into<String>,
        input: InputRef,
        reducer: Reducer,
        output_type: DataType,
    ) -> Self {
        AggregationStep {
            output_column: output_column.into(),
            input,
            reducer,
            output_type,
        }
    }

    /// A built-in aggregation over a source column. Built-ins produce numbers.
    pub fn builtin(
        output_column: impl Into<String>,
        column: impl Into<String>,
        aggregation: AggregationType,
    ) -> Self {
        Self::new(
            output_column,
            InputRef::Column(column.into()),
            Reducer::Builtin(aggregation),
            DataType::Number,
        )
    }

    /// A custom reducer over a source column.
    pub fn custom<F>(
        output_column: impl Into<String>,
        column: impl Into<String>,
        output_type: DataType,
        func: F,
    ) -> Self
    where
        F: Fn(&[&Value]) -> Result<Value, ReducerError> + Send + Sync + 'static,
    {
        let output_column = output_column.into();
        let reducer = CustomReducer::new(output_column.clone(), func);
        Self::new(
            output_column,
            InputRef::Column(column.into()),
            Reducer::Custom(reducer),
            output_type,
        )
    }

    /// Reads the step's input from a row expression instead of a column.
    pub fn with_expression(mut self, expr: RowExpr) -> Self {
        self.input = InputRef::Expression(expr);
        self
    }
}

// ============================================================================
// REQUEST
// ============================================================================

/// Everything a single subtotal run needs besides the source table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtotalRequest {
    /// Columns to group by, in output order.
    pub key_columns: Vec<String>,

    /// Grand and sub totals to combine.
    pub subtotals: Vec<SubtotalSpec>,

    /// Measures, in output order after the key columns.
    pub aggregated_columns: Vec<AggregationStep>,

    /// When set, only totals covering all these columns are produced and
    /// the plain group-by pass is skipped.
    #[serde(default)]
    pub totals_only: Option<Vec<String>>,

    #[serde(default)]
    pub options: EngineOptions,
}

impl SubtotalRequest {
    pub fn new<S: Into<String>>(
        key_columns: impl IntoIterator<Item = S>,
        subtotals: Vec<SubtotalSpec>,
        aggregated_columns: Vec<AggregationStep>,
    ) -> Self {
        SubtotalRequest {
            key_columns: key_columns.into_iter().map(Into::into).collect(),
            subtotals,
            aggregated_columns,
            totals_only: None,
            options: EngineOptions::default(),
        }
    }

    pub fn with_totals_only<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.totals_only = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Totals-only columns, with an empty list treated as absent.
    pub fn totals_only(&self) -> Option<&[String]> {
        self.totals_only.as_deref().filter(|cols| !cols.is_empty())
    }
}
