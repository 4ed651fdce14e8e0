//! FILENAME: core/subtotal-engine/src/subset.rs
//! Subset algebra: size-k combinations of a sequence.
//!
//! Identity is positional. Combinations are emitted in lexicographic order
//! of source indices, which is the order of the include-first/exclude-first
//! recursive decomposition. The recursion is unrolled onto an explicit
//! stack so depth never depends on the call stack.

use smallvec::SmallVec;

/// Source positions of one combination, ascending.
pub type IndexSet = SmallVec<[usize; 8]>;

/// Every way to choose `size` positions out of `0..len`, in lexicographic order.
///
/// `size == 0` yields one empty combination; `size > len` yields none.
pub fn index_combinations(len: usize, size: usize) -> Vec<IndexSet> {
    if size > len {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(binomial(len, size).min(1 << 16));

    // Each frame is a partial combination plus the first position still
    // eligible. Candidates are pushed in reverse so the smallest index is
    // explored first.
    let mut stack: Vec<(usize, IndexSet)> = vec![(0, IndexSet::new())];

    while let Some((next, picked)) = stack.pop() {
        let remaining = size - picked.len();
        if remaining == 0 {
            out.push(picked);
            continue;
        }

        // Leave room for the positions still to be picked.
        let last_start = len - remaining;
        for i in (next..=last_start).rev() {
            let mut extended = picked.clone();
            extended.push(i);
            stack.push((i + 1, extended));
        }
    }

    out
}

/// Every way to choose `size` elements of `items`, preserving relative order.
pub fn combinations<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    index_combinations(items.len(), size)
        .into_iter()
        .map(|indices| indices.iter().map(|&i| items[i].clone()).collect())
        .collect()
}

/// C(n, k), saturating at `usize::MAX`.
pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k {
        // Exact at every step: the running product is C(n, i + 1).
        result = match result.checked_mul((n - i) as u128) {
            Some(product) => product / (i + 1) as u128,
            None => return usize::MAX,
        };
        if result > usize::MAX as u128 {
            return usize::MAX;
        }
    }
    result as usize
}
