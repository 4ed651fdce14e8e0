//! FILENAME: core/subtotal-engine/src/engine.rs
//! Subtotal Engine - Runs a request against a source table.
//!
//! A run moves through fixed phases:
//! 1. Validating: parameter checks and column resolution (`guard`).
//! 2. Enumerating: every valid combination of specifications, sizes
//!    ascending, lexicographic within a size.
//! 3. Transforming: one relabelled view per combination, concatenated.
//! 4. Aggregating: one pass over the concatenated views and, unless
//!    totals-only columns are given, one pass over the untouched source.
//! 5. Merging: combination rows first, then base rows.
//!
//! Any error ends the run; nothing partial is returned.

use std::ops::RangeInclusive;

use dataset::Table;
use log::{debug, info};
use serde::Serialize;
use smallvec::SmallVec;

use crate::aggregate::aggregate;
use crate::definition::{AggregationStep, SubtotalRequest, SubtotalSpec, TotalColumn};
use crate::error::SubtotalResult;
use crate::guard::validate_request;
use crate::options::DEFAULT_MIN_COMBINATION_SIZE;
use crate::subset::IndexSet;
use crate::transform::{apply_combination, ResolvedSpec};
use crate::validator::{
    count_valid_combinations, distinct_columns, first_appearance, valid_combinations,
};

const LOG_TARGET: &str = "subtotal";

// ============================================================================
// OUTPUT
// ============================================================================

/// What a run did, phase by phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SubtotalStats {
    /// Valid combinations expanded.
    pub combinations: usize,
    /// Rows across all transformed views.
    pub combined_rows: usize,
    /// Output rows produced from the transformed views.
    pub combination_groups: usize,
    /// Output rows of the plain group-by; `None` when it was skipped.
    pub base_groups: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct SubtotalOutput {
    pub table: Table,
    pub stats: SubtotalStats,
}

// ============================================================================
// PLANNING
// ============================================================================

/// Combination sizes to enumerate.
///
/// The upper bound is the number of distinct subtotal columns. The lower
/// bound is the number of distinct totals-only columns, or
/// `DEFAULT_MIN_COMBINATION_SIZE` without them, capped at the upper bound.
pub fn combination_size_range<S: TotalColumn>(
    specs: &[S],
    totals_only: Option<&[String]>,
) -> RangeInclusive<usize> {
    let max_size = distinct_columns(specs).len();
    let min_size = match totals_only {
        Some(cols) => first_appearance(cols.iter().map(String::as_str)).len(),
        None => DEFAULT_MIN_COMBINATION_SIZE,
    };
    min_size.min(max_size)..=max_size
}

/// Every valid combination of `specs`, as positions into `specs`.
///
/// Without specifications there is nothing to total and the plan is empty.
pub fn plan_combinations<S: TotalColumn>(
    specs: &[S],
    totals_only: Option<&[String]>,
) -> Vec<IndexSet> {
    if specs.is_empty() {
        return Vec::new();
    }

    combination_size_range(specs, totals_only)
        .flat_map(|size| valid_combinations(specs, totals_only, size))
        .collect()
}

/// Number of combinations `plan_combinations` would return.
fn planned_count<S: TotalColumn>(specs: &[S], totals_only: Option<&[String]>) -> usize {
    if specs.is_empty() {
        return 0;
    }
    let sizes = combination_size_range(specs, totals_only);
    count_valid_combinations(specs, totals_only, *sizes.start(), *sizes.end())
}

// ============================================================================
// RUN
// ============================================================================

/// Runs `request` against `source`.
pub fn run_subtotals(source: &Table, request: &SubtotalRequest) -> SubtotalResult<SubtotalOutput> {
    info!(
        target: LOG_TARGET,
        "run: rows={} keys=[{}] subtotals={} measures={} totals_only={:?}",
        source.len(),
        request.key_columns.join(", "),
        request.subtotals.len(),
        request.aggregated_columns.len(),
        request.totals_only()
    );

    // Validating
    let plan = validate_request(source.schema(), request)?;
    let totals_only = request.totals_only();

    let planned = planned_count(&plan.specs, totals_only);
    request.options.check_combination_count(planned)?;

    // Enumerating
    let combinations = plan_combinations(&plan.specs, totals_only);
    debug!(
        target: LOG_TARGET,
        "sizes {:?}: {} combinations",
        combination_size_range(&plan.specs, totals_only),
        combinations.len()
    );

    // Transforming
    let mut combined = Table::new(plan.view_schema.clone());
    for combo in &combinations {
        let members: SmallVec<[ResolvedSpec<'_>; 8]> =
            combo.iter().map(|&i| plan.specs[i]).collect();
        combined.concat(apply_combination(&members, source, &plan.view_schema))?;
    }
    debug!(target: LOG_TARGET, "combined views: {} rows", combined.len());

    // Aggregating
    let mut table = aggregate(&combined, &plan.key_columns, &plan.steps, &plan.output_schema)?;
    let combination_groups = table.len();

    let base_groups = match totals_only {
        Some(_) => None,
        None => {
            let base = aggregate(source, &plan.key_columns, &plan.steps, &plan.output_schema)?;
            let groups = base.len();
            // Merging
            table.concat(base)?;
            Some(groups)
        }
    };

    let stats = SubtotalStats {
        combinations: combinations.len(),
        combined_rows: combined.len(),
        combination_groups,
        base_groups,
    };
    info!(
        target: LOG_TARGET,
        "done: {} output rows ({} from totals, {:?} base)",
        table.len(),
        combination_groups,
        base_groups
    );

    Ok(SubtotalOutput { table, stats })
}

/// Single-call form of `run_subtotals` with default options.
pub fn aggregate_with_subtotals(
    source: &Table,
    key_columns: &[&str],
    subtotals: Vec<SubtotalSpec>,
    aggregated_columns: Vec<AggregationStep>,
    totals_only: Option<&[&str]>,
) -> SubtotalResult<Table> {
    let mut request = SubtotalRequest::new(key_columns.iter().copied(), subtotals, aggregated_columns);
    if let Some(cols) = totals_only {
        request = request.with_totals_only(cols.iter().copied());
    }
    Ok(run_subtotals(source, &request)?.table)
}
