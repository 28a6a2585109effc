use mmlu_eval_core::{CoreError, Result};
use rust_decimal::prelude::RoundingStrategy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Request counts keyed by the model identifier that served them.
///
/// Iteration is ordered by model identifier. Two tallies merge by summing
/// counts key by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelCounts(BTreeMap<String, usize>);

impl ModelCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, model: impl Into<String>) {
        *self.0.entry(model.into()).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: &ModelCounts) {
        for (model, count) in &other.0 {
            *self.0.entry(model.clone()).or_insert(0) += count;
        }
    }

    pub fn get(&self, model: &str) -> usize {
        self.0.get(model).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(model, count)| (model.as_str(), *count))
    }

    /// Share of `total` requests served by each model, in percent.
    pub fn percentages(&self, total: usize) -> Vec<(String, f64)> {
        self.0
            .iter()
            .map(|(model, count)| {
                let share = if total == 0 {
                    0.0
                } else {
                    *count as f64 / total as f64 * 100.0
                };
                (model.clone(), share)
            })
            .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ModelCounts {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut counts = Self::new();
        for model in iter {
            counts.record(model);
        }
        counts
    }
}

impl fmt::Display for ModelCounts {
    /// Renders as `model-a: 3, model-b: 1`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(model, count)| format!("{}: {}", model, count))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Outcome of evaluating one subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectResult {
    pub subject: String,
    /// Correctness of each test question, in table order.
    pub cors: Vec<bool>,
    pub accuracy: f64,
    pub latency: Duration,
    pub model_counts: ModelCounts,
    /// Few-shot examples that fit in the prompt budget.
    pub shots: usize,
}

impl SubjectResult {
    pub fn new(
        subject: impl Into<String>,
        cors: Vec<bool>,
        latency: Duration,
        model_counts: ModelCounts,
        shots: usize,
    ) -> Self {
        let accuracy = mean(&cors);
        Self {
            subject: subject.into(),
            cors,
            accuracy,
            latency,
            model_counts,
            shots,
        }
    }

    pub fn num_questions(&self) -> usize {
        self.cors.len()
    }

    pub fn num_correct(&self) -> usize {
        self.cors.iter().filter(|c| **c).count()
    }
}

/// Totals over every evaluated subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub subjects: usize,
    pub total_latency: Duration,
    /// Correct answers over all questions, so larger subjects weigh more.
    pub accuracy: f64,
    pub num_requests: usize,
    pub model_counts: ModelCounts,
}

impl RunSummary {
    pub fn model_percentages(&self) -> Vec<(String, f64)> {
        self.model_counts.percentages(self.num_requests)
    }
}

/// Folds per-subject results into a [`RunSummary`].
#[derive(Debug, Default)]
pub struct RunAggregator {
    all_cors: Vec<bool>,
    latencies: Vec<Duration>,
    model_counts: ModelCounts,
    num_requests: usize,
    subjects: usize,
}

impl RunAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &SubjectResult) {
        self.all_cors.extend_from_slice(&result.cors);
        self.latencies.push(result.latency);
        self.model_counts.merge(&result.model_counts);
        self.num_requests += result.num_questions();
        self.subjects += 1;

        tracing::debug!(
            subject = %result.subject,
            questions = result.num_questions(),
            running_requests = self.num_requests,
            "Recorded subject result"
        );
    }

    pub fn subjects(&self) -> usize {
        self.subjects
    }

    pub fn summary(&self) -> Result<RunSummary> {
        if self.subjects == 0 {
            return Err(CoreError::Data("no subjects were evaluated".to_string()));
        }

        Ok(RunSummary {
            subjects: self.subjects,
            total_latency: self.latencies.iter().sum(),
            accuracy: mean(&self.all_cors),
            num_requests: self.num_requests,
            model_counts: self.model_counts.clone(),
        })
    }
}

/// Fraction of `true` values; zero for an empty slice.
pub fn mean(values: &[bool]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|v| **v).count() as f64 / values.len() as f64
}

/// Round the exact binary value of `value` half to even at `dp` places,
/// as Python's `round` does.
pub fn round_decimal(value: f64, dp: u32) -> Decimal {
    Decimal::from_f64_retain(value)
        .unwrap_or_default()
        .round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven)
}
