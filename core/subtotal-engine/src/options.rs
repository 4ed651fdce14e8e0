//! FILENAME: core/subtotal-engine/src/options.rs
//! Engine options.
//!
//! Plain serde structs with per-field defaults, so a partial JSON document
//! (or none at all) yields a usable configuration.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{SubtotalError, SubtotalResult};

/// Default ceiling on the number of subtotal combinations a single run may expand to.
pub const DEFAULT_MAX_COMBINATIONS: usize = 4096;

/// Smallest combination size when no totals-only columns are given.
pub const DEFAULT_MIN_COMBINATION_SIZE: usize = 1;

/// What to do when a run would expand to more combinations than allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LimitPolicy {
    /// Fail the run with `CombinationLimitExceeded` (default).
    #[default]
    Reject,
    /// Log a warning and run anyway.
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Maximum number of valid subtotal combinations to expand.
    #[serde(default = "default_max_combinations")]
    pub max_combinations: usize,

    /// Behaviour when `max_combinations` is exceeded.
    #[serde(default)]
    pub on_limit: LimitPolicy,
}

fn default_max_combinations() -> usize {
    DEFAULT_MAX_COMBINATIONS
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            max_combinations: DEFAULT_MAX_COMBINATIONS,
            on_limit: LimitPolicy::Reject,
        }
    }
}

impl EngineOptions {
    /// Loads options from a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> SubtotalResult<Self> {
        serde_json::from_str(json).map_err(|e| SubtotalError::InvalidOptions(e.to_string()))
    }

    pub fn with_max_combinations(mut self, limit: usize) -> Self {
        self.max_combinations = limit;
        self
    }

    pub fn with_limit_policy(mut self, policy: LimitPolicy) -> Self {
        self.on_limit = policy;
        self
    }

    /// Applies the combination ceiling to a planned combination count.
    pub fn check_combination_count(&self, planned: usize) -> SubtotalResult<()> {
        if planned <= self.max_combinations {
            return Ok(());
        }
        match self.on_limit {
            LimitPolicy::Reject => Err(SubtotalError::CombinationLimitExceeded {
                planned,
                limit: self.max_combinations,
            }),
            LimitPolicy::Warn => {
                warn!(
                    "{} subtotal combinations planned, above the limit of {}; continuing",
                    planned, self.max_combinations
                );
                Ok(())
            }
        }
    }
}
