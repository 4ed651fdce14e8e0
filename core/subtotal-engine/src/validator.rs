//! FILENAME: core/subtotal-engine/src/validator.rs
//! Validity of a combination of subtotal specifications.
//!
//! A combination may hold at most one specification per column, and in
//! totals-only mode it must cover every totals-only column.

use crate::definition::TotalColumn;
use crate::subset::IndexSet;

/// True if `combination` names distinct columns and, when `totals_only`
/// is given, includes every one of those columns.
pub fn is_valid<S: TotalColumn>(combination: &[S], totals_only: Option<&[String]>) -> bool {
    let columns: Vec<&str> = combination.iter().map(|s| s.total_column()).collect();

    let distinct = columns
        .iter()
        .enumerate()
        .all(|(i, col)| !columns[..i].contains(col));
    if !distinct {
        return false;
    }

    match totals_only {
        Some(required) => required.iter().all(|col| columns.contains(&col.as_str())),
        None => true,
    }
}

/// `names` without repeats, in order of first appearance.
pub fn first_appearance<'a, I>(names: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut distinct: Vec<&str> = Vec::new();
    for name in names {
        if !distinct.contains(&name) {
            distinct.push(name);
        }
    }
    distinct
}

/// Names that occur more than once in `names`, each reported once, in
/// order of their second appearance.
pub fn repeated<'a, I>(names: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: Vec<&str> = Vec::new();
    let mut repeated: Vec<&str> = Vec::new();
    for name in names {
        if !seen.contains(&name) {
            seen.push(name);
        } else if !repeated.contains(&name) {
            repeated.push(name);
        }
    }
    repeated
}

/// Distinct columns referenced by `specs`, in order of first appearance.
pub fn distinct_columns<S: TotalColumn>(specs: &[S]) -> Vec<&str> {
    first_appearance(specs.iter().map(|s| s.total_column()))
}

/// Every valid combination of exactly `size` specifications, as ascending
/// positions into `specs`, in lexicographic order.
///
/// The walk never extends a partial combination with a second
/// specification on a column it already holds, and drops a partial
/// combination once the slots left cannot cover the missing totals-only
/// columns. Work is therefore bounded by the number of distinct-column
/// partial combinations rather than by C(specs.len(), size).
pub fn valid_combinations<S: TotalColumn>(
    specs: &[S],
    totals_only: Option<&[String]>,
    size: usize,
) -> Vec<IndexSet> {
    let required = first_appearance(totals_only.unwrap_or(&[]).iter().map(String::as_str));
    if size > specs.len() || size < required.len() {
        return Vec::new();
    }

    let holds = |picked: &IndexSet, column: &str| {
        picked.iter().any(|&p| specs[p].total_column() == column)
    };

    let mut out = Vec::new();
    // Same frame layout as `subset::index_combinations`: a partial
    // combination and the first position still eligible.
    let mut stack: Vec<(usize, IndexSet)> = vec![(0, IndexSet::new())];

    while let Some((next, picked)) = stack.pop() {
        let remaining = size - picked.len();
        let uncovered = required.iter().filter(|col| !holds(&picked, **col)).count();
        if remaining == 0 {
            if uncovered == 0 {
                out.push(picked);
            }
            continue;
        }
        if uncovered > remaining {
            continue;
        }

        let last_start = specs.len() - remaining;
        for i in (next..=last_start).rev() {
            if holds(&picked, specs[i].total_column()) {
                continue;
            }
            let mut extended = picked.clone();
            extended.push(i);
            stack.push((i + 1, extended));
        }
    }

    out
}

/// Number of valid combinations with sizes in `min_size..=max_size`,
/// computed without enumerating them.
///
/// A valid combination picks a set of distinct columns and one
/// specification per picked column, so the count for size k is the k-th
/// elementary symmetric sum of the per-column specification counts.
/// Totals-only columns are mandatory and contribute a fixed factor.
/// Saturates at `usize::MAX`.
pub fn count_valid_combinations<S: TotalColumn>(
    specs: &[S],
    totals_only: Option<&[String]>,
    min_size: usize,
    max_size: usize,
) -> usize {
    let columns = distinct_columns(specs);
    let per_column = |col: &str| -> u128 {
        specs.iter().filter(|s| s.total_column() == col).count() as u128
    };

    let required = first_appearance(totals_only.unwrap_or(&[]).iter().map(String::as_str));
    if required.iter().any(|col| !columns.contains(col)) {
        return 0;
    }

    let required_product = required
        .iter()
        .fold(1u128, |acc, &col| acc.saturating_mul(per_column(col)));

    // elementary[m] = sum over m-subsets of optional columns of the product of their counts
    let optional: Vec<u128> = columns
        .iter()
        .copied()
        .filter(|col| !required.contains(col))
        .map(per_column)
        .collect();
    let mut elementary = vec![0u128; optional.len() + 1];
    elementary[0] = 1;
    for (seen, &count) in optional.iter().enumerate() {
        for m in (1..=seen + 1).rev() {
            elementary[m] = elementary[m].saturating_add(elementary[m - 1].saturating_mul(count));
        }
    }

    let mut total: u128 = 0;
    for size in min_size..=max_size {
        if size < required.len() {
            continue;
        }
        if let Some(&e) = elementary.get(size - required.len()) {
            total = total.saturating_add(required_product.saturating_mul(e));
        }
    }

    usize::try_from(total).unwrap_or(usize::MAX)
}
