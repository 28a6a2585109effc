use mmlu_eval_core::{Backend, CoreError, Result, SamplingParams, SubjectData};
use mmlu_eval_metrics::{ChoiceAccuracyCalculator, LatencyCalculator, ModelCounts, SubjectResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use super::PromptBuilder;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Few-shot examples requested before budget truncation.
    pub ntrain: usize,
    /// Upper bound on requests the backend keeps in flight.
    pub parallel: usize,
    pub sampling: SamplingParams,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            ntrain: 5,
            parallel: 64,
            sampling: SamplingParams::default(),
        }
    }
}

/// Runs one subject's test questions through the backend and scores them.
pub struct SubjectEvaluator {
    config: EvaluationConfig,
    prompts: PromptBuilder,
    backend: Arc<dyn Backend>,
}

impl SubjectEvaluator {
    /// Fails with a validation error when the sampling parameters are out of range.
    pub fn new(
        config: EvaluationConfig,
        prompts: PromptBuilder,
        backend: Arc<dyn Backend>,
    ) -> Result<Self> {
        config.sampling.validate()?;

        Ok(Self {
            config,
            prompts,
            backend,
        })
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub async fn evaluate(&self, subject: &SubjectData) -> Result<SubjectResult> {
        let prefix = self
            .prompts
            .few_shot_prefix(&subject.name, &subject.dev, self.config.ntrain);
        let requests = self.prompts.requests(&prefix, &subject.test);
        let labels = subject.labels();
        let submitted = requests.len();

        tracing::info!(
            "Evaluating {} with {} questions and {} shots",
            subject.name,
            submitted,
            prefix.shots
        );

        let start = LatencyCalculator::start();
        let generations = self
            .backend
            .run_batch(requests, &self.config.sampling, self.config.parallel)
            .await?;
        let latency = LatencyCalculator::measure(start);

        if generations.len() != submitted {
            return Err(CoreError::Backend(format!(
                "{}: submitted {} requests but received {} generations",
                subject.name,
                submitted,
                generations.len()
            )));
        }

        let texts: Vec<&str> = generations.iter().map(|g| g.text.as_str()).collect();
        let cors = ChoiceAccuracyCalculator::score_all(&texts, &labels);
        let model_counts: ModelCounts = generations.iter().map(|g| g.model.as_str()).collect();

        Ok(SubjectResult::new(
            subject.name.clone(),
            cors,
            latency,
            model_counts,
            prefix.shots,
        ))
    }
}
