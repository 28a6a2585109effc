pub mod accuracy;
pub mod latency;

pub use accuracy::*;
pub use latency::*;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricInput {
    pub predicted: String,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricOutput {
    pub score: Decimal,
    pub metadata: serde_json::Value,
}
