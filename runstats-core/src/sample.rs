use std::collections::BTreeMap;

/// The output of one sampler invocation: metric key to value.
pub type Samples = BTreeMap<String, f64>;

/// A single named observation, ready to be transmitted.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    /// The fully qualified metric name.
    pub name: String,
    /// The observed value.
    pub value: f64,
}

impl Sample {
    /// Creates a new sample.
    pub fn new<N: Into<String>>(name: N, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}
