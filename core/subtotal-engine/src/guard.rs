//! FILENAME: core/subtotal-engine/src/guard.rs
//! Parameter checks run once, before any view is built.
//!
//! The combination expansion scans the source once per combination, so
//! every caller mistake is reported here with the offending names instead
//! of surfacing halfway through a run. A successful check returns a
//! `ResolvedPlan` whose column ids are reused by every later phase.

use dataset::{ColumnDef, ColumnId, DataType, Schema, Value};

use crate::aggregate::ResolvedStep;
use crate::definition::{Reducer, SubtotalRequest, SubtotalSpec};
use crate::error::{KeyColumnIssue, SubtotalError, SubtotalResult};
use crate::transform::ResolvedSpec;
use crate::validator::{distinct_columns, first_appearance, repeated};

/// Column ids and schemas derived from a validated request.
#[derive(Debug, Clone)]
pub struct ResolvedPlan<'a> {
    pub key_columns: Vec<ColumnId>,
    pub specs: Vec<ResolvedSpec<'a>>,
    pub steps: Vec<ResolvedStep<'a>>,
    /// Source schema with subtotal columns widened to hold alias labels.
    pub view_schema: Schema,
    /// Key columns followed by step outputs.
    pub output_schema: Schema,
}

/// Runs every check in order and resolves the request against `schema`.
pub fn validate_request<'a>(
    schema: &Schema,
    request: &'a SubtotalRequest,
) -> SubtotalResult<ResolvedPlan<'a>> {
    validate_key_columns(&request.key_columns, &request.subtotals)?;
    validate_specifications(&request.subtotals)?;
    if let Some(totals_only) = request.totals_only() {
        validate_totals_only(totals_only, &request.subtotals)?;
    }
    validate_against_schema(schema, request)
}

/// Key columns must be non-empty and distinct, and every subtotal column must be one of them.
pub fn validate_key_columns(key_columns: &[String], specs: &[SubtotalSpec]) -> SubtotalResult<()> {
    if key_columns.is_empty() {
        return Err(SubtotalError::InvalidKeyColumns(KeyColumnIssue::Empty));
    }

    let duplicated = repeated(key_columns.iter().map(String::as_str));
    if !duplicated.is_empty() {
        return Err(SubtotalError::InvalidKeyColumns(KeyColumnIssue::Duplicated(
            duplicated.into_iter().map(str::to_string).collect(),
        )));
    }

    let missing: Vec<String> = distinct_columns(specs)
        .into_iter()
        .filter(|col| !key_columns.iter().any(|k| k == col))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(SubtotalError::InvalidKeyColumns(KeyColumnIssue::NotInKeys(missing)));
    }

    Ok(())
}

/// No two specifications on the same column may share an alias.
pub fn validate_specifications(specs: &[SubtotalSpec]) -> SubtotalResult<()> {
    for (i, spec) in specs.iter().enumerate() {
        let clash = specs[..i]
            .iter()
            .any(|earlier| earlier.column == spec.column && earlier.alias == spec.alias);
        if clash {
            return Err(SubtotalError::DuplicateAlias {
                column: spec.column.clone(),
                alias: spec.alias.clone(),
            });
        }
    }
    Ok(())
}

/// Every totals-only column must have at least one specification.
pub fn validate_totals_only(totals_only: &[String], specs: &[SubtotalSpec]) -> SubtotalResult<()> {
    let covered = distinct_columns(specs);

    let offending: Vec<String> = first_appearance(totals_only.iter().map(String::as_str))
        .into_iter()
        .filter(|col| !covered.contains(col))
        .map(str::to_string)
        .collect();

    if offending.is_empty() {
        Ok(())
    } else {
        Err(SubtotalError::InvalidTotalsOnly {
            columns: offending,
            expected: covered.into_iter().map(str::to_string).collect(),
        })
    }
}

/// Resolves key columns, subtotal columns and measure inputs against the
/// source schema and derives the view and output schemas.
pub fn validate_against_schema<'a>(
    schema: &Schema,
    request: &'a SubtotalRequest,
) -> SubtotalResult<ResolvedPlan<'a>> {
    let resolve = |name: &str| {
        schema
            .resolve(name)
            .map_err(|_| SubtotalError::UnknownColumn(name.to_string()))
    };

    let key_columns = request
        .key_columns
        .iter()
        .map(|name| resolve(name.as_str()))
        .collect::<SubtotalResult<Vec<_>>>()?;

    let specs = request
        .subtotals
        .iter()
        .map(|spec| -> SubtotalResult<ResolvedSpec<'a>> {
            Ok(ResolvedSpec { spec, column: resolve(spec.column.as_str())? })
        })
        .collect::<SubtotalResult<Vec<_>>>()?;

    let steps = request
        .aggregated_columns
        .iter()
        .map(|step| ResolvedStep::resolve(step, schema))
        .collect::<SubtotalResult<Vec<_>>>()?;

    for (i, step) in request.aggregated_columns.iter().enumerate() {
        let name = &step.output_column;
        let taken = request.key_columns.contains(name)
            || request.aggregated_columns[..i].iter().any(|s| &s.output_column == name);
        if taken {
            return Err(SubtotalError::DuplicateOutputColumn(name.clone()));
        }
        // Built-ins yield numbers or empty.
        let builtin = matches!(step.reducer, Reducer::Builtin(_));
        if builtin && !step.output_type.admits(&Value::Number(0.0)) {
            return Err(SubtotalError::InvalidOutputType {
                output_column: name.clone(),
                declared: step.output_type,
            });
        }
    }

    let view_schema = widen_for_aliases(schema, &specs)?;
    let output_schema = view_schema.project(&key_columns)?.extend(
        request
            .aggregated_columns
            .iter()
            .map(|step| ColumnDef::new(step.output_column.clone(), step.output_type))
            .collect(),
    )?;

    Ok(ResolvedPlan {
        key_columns,
        specs,
        steps,
        view_schema,
        output_schema,
    })
}

/// Aliases are text. Subtotal columns declared with a type that cannot
/// hold text are relaxed to `Any` in transformed views and in the output.
fn widen_for_aliases(schema: &Schema, specs: &[ResolvedSpec<'_>]) -> SubtotalResult<Schema> {
    let mut columns = schema.columns().to_vec();
    for spec in specs {
        let def = &mut columns[spec.column.index()];
        if !def.data_type.admits(&spec.spec.alias_value()) {
            def.data_type = DataType::Any;
        }
    }
    Ok(Schema::new(columns)?)
}
