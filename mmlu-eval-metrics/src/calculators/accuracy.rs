use async_trait::async_trait;
use mmlu_eval_core::{MetricCalculator, Result};
use rust_decimal::Decimal;
use serde_json::json;

use super::{MetricInput, MetricOutput};

/// Scores a multiple-choice generation by its first non-whitespace character.
///
/// The comparison is case-sensitive and all-or-nothing: `" B"` matches the
/// label `"B"`, `"b"` does not, and output with no visible characters never
/// matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChoiceAccuracyCalculator;

impl ChoiceAccuracyCalculator {
    pub fn new() -> Self {
        Self
    }

    /// First non-whitespace character of `generated`, or an empty string.
    pub fn extract_choice(generated: &str) -> String {
        generated
            .trim()
            .chars()
            .next()
            .map(String::from)
            .unwrap_or_default()
    }

    pub fn is_correct(generated: &str, label: &str) -> bool {
        Self::extract_choice(generated) == label
    }

    /// Correctness of each generation against the label at the same position.
    pub fn score_all<G, L>(generations: &[G], labels: &[L]) -> Vec<bool>
    where
        G: AsRef<str>,
        L: AsRef<str>,
    {
        generations
            .iter()
            .zip(labels.iter())
            .map(|(generated, label)| Self::is_correct(generated.as_ref(), label.as_ref()))
            .collect()
    }
}

#[async_trait]
impl MetricCalculator for ChoiceAccuracyCalculator {
    type Input = MetricInput;
    type Output = MetricOutput;

    async fn calculate(&self, input: Self::Input) -> Result<Self::Output> {
        let prediction = Self::extract_choice(&input.predicted);

        let score = match input.reference.as_deref() {
            Some(reference) if prediction == reference => Decimal::ONE,
            _ => Decimal::ZERO,
        };

        Ok(MetricOutput {
            score,
            metadata: json!({
                "metric": "accuracy",
                "prediction": prediction,
            }),
        })
    }
}
