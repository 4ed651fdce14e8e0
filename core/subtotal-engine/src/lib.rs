//! FILENAME: core/subtotal-engine/src/lib.rs
//! Grand/sub total aggregation for in-memory tables.
//!
//! Expands every valid combination of subtotal specifications into a
//! relabelled view of the source, aggregates all views in one pass and
//! appends the plain group-by. Depends on `dataset` for the table types.
//!
//! Layers:
//! - `definition`: Serializable configuration (what a run IS)
//! - `guard`: Parameter checks and column resolution
//! - `subset` / `validator`: Which combinations exist
//! - `transform` / `aggregate`: Per-combination views and the group-by
//! - `engine`: The run itself
//! - `aggregator`: Incremental front end over `engine`

pub mod accumulator;
pub mod aggregate;
pub mod aggregator;
pub mod definition;
pub mod engine;
pub mod error;
pub mod guard;
pub mod options;
pub mod subset;
pub mod transform;
pub mod validator;

pub use aggregator::SubtotalAggregator;
pub use definition::*;
pub use engine::{
    aggregate_with_subtotals, combination_size_range, plan_combinations, run_subtotals,
    SubtotalOutput, SubtotalStats,
};
pub use error::{ErrorKind, KeyColumnIssue, ReducerError, SubtotalError, SubtotalResult};
pub use options::{EngineOptions, LimitPolicy, DEFAULT_MAX_COMBINATIONS, DEFAULT_MIN_COMBINATION_SIZE};
