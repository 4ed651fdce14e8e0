//! FILENAME: core/subtotal-engine/src/accumulator.rs
//! Incremental state for the built-in reducers.

use dataset::Value;

use crate::definition::AggregationType;

/// Accumulator for computing aggregates incrementally.
/// Stores intermediate state needed for all aggregation types.
#[derive(Debug, Clone, Default)]
pub struct AggregateAccumulator {
    pub sum: f64,
    pub count: u64,
    pub count_numbers: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub product: Option<f64>,
    /// For variance/stddev: sum of squared differences from mean.
    /// Using Welford's algorithm for numerical stability.
    pub m2: f64,
    pub mean: f64,
}

impl AggregateAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an accumulator over a group's values.
    pub fn from_values<'v>(values: impl IntoIterator<Item = &'v Value>) -> Self {
        let mut acc = Self::new();
        for value in values {
            acc.add(value);
        }
        acc
    }

    pub fn add(&mut self, value: &Value) {
        match value {
            Value::Number(n) => self.add_number(*n),
            Value::Empty => {}
            _ => self.add_non_number(),
        }
    }

    /// Adds a numeric value to the accumulator.
    pub fn add_number(&mut self, value: f64) {
        self.count += 1;
        self.count_numbers += 1;
        self.sum += value;

        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
        self.product = Some(self.product.map_or(value, |p| p * value));

        // Welford's algorithm for variance
        let delta = value - self.mean;
        self.mean += delta / (self.count_numbers as f64);
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    /// Adds a non-numeric value (only increments count).
    pub fn add_non_number(&mut self) {
        self.count += 1;
    }

    /// Computes the final aggregate value.
    /// Statistics that are undefined for the group come back as `Empty`.
    pub fn compute(&self, aggregation: AggregationType) -> Value {
        let n = self.count_numbers as f64;
        let result = match aggregation {
            AggregationType::Sum => Some(self.sum),
            AggregationType::Count => Some(self.count as f64),
            AggregationType::CountNumbers => Some(n),
            AggregationType::Average => (self.count_numbers > 0).then(|| self.sum / n),
            AggregationType::Min => self.min,
            AggregationType::Max => self.max,
            AggregationType::Product => self.product,
            AggregationType::Var => (self.count_numbers > 1).then(|| self.m2 / (n - 1.0)),
            AggregationType::VarP => (self.count_numbers > 0).then(|| self.m2 / n),
            AggregationType::StdDev => {
                (self.count_numbers > 1).then(|| (self.m2 / (n - 1.0)).sqrt())
            }
            AggregationType::StdDevP => (self.count_numbers > 0).then(|| (self.m2 / n).sqrt()),
        };
        result.map_or(Value::Empty, Value::Number)
    }
}
