use mmlu_eval_core::Result;
use mmlu_eval_metrics::{RunAggregator, RunSummary, SubjectResult};

use crate::tasks::{DatasetLoader, SubjectEvaluator};

/// Evaluates subjects one after another and folds their results.
pub struct EvaluationPipeline {
    loader: DatasetLoader,
    evaluator: SubjectEvaluator,
}

impl EvaluationPipeline {
    pub fn new(loader: DatasetLoader, evaluator: SubjectEvaluator) -> Self {
        Self { loader, evaluator }
    }

    pub fn loader(&self) -> &DatasetLoader {
        &self.loader
    }

    pub fn evaluator(&self) -> &SubjectEvaluator {
        &self.evaluator
    }

    pub async fn discover_subjects(&self) -> Result<Vec<String>> {
        self.loader.discover_subjects().await
    }

    /// Evaluate `subjects` in order, calling `on_result` after each one.
    ///
    /// The first failing subject aborts the run.
    pub async fn run<F>(&self, subjects: &[String], mut on_result: F) -> Result<RunSummary>
    where
        F: FnMut(&SubjectResult),
    {
        let mut aggregator = RunAggregator::new();

        for subject in subjects {
            let data = self.loader.load_subject(subject).await?;
            let result = self.evaluator.evaluate(&data).await?;

            tracing::info!(
                subject = %result.subject,
                accuracy = result.accuracy,
                latency_secs = result.latency.as_secs_f64(),
                "Subject evaluated"
            );

            aggregator.record(&result);
            on_result(&result);
        }

        aggregator.summary()
    }

    /// Discover subjects and evaluate all of them.
    pub async fn run_all(&self) -> Result<RunSummary> {
        let subjects = self.discover_subjects().await?;
        self.run(&subjects, |_| {}).await
    }
}

/// Per-subject console line.
pub fn format_subject_line(result: &SubjectResult) -> String {
    format!(
        "Average accuracy {:.3}, latency {:.2}, #q: {} - {}, routing: {}",
        result.accuracy,
        result.latency.as_secs_f64(),
        result.num_questions(),
        result.subject,
        result.model_counts
    )
}

/// End-of-run console lines.
pub fn format_summary_lines(summary: &RunSummary) -> Vec<String> {
    let percentages: Vec<String> = summary
        .model_percentages()
        .iter()
        .map(|(model, share)| format!("{}: {:.3}%", model, share))
        .collect();

    vec![
        format!("Total latency: {:.3}", summary.total_latency.as_secs_f64()),
        format!("Average accuracy: {:.3}", summary.accuracy),
        format!("Model counts: {}", summary.model_counts),
        format!("Model %: {}", percentages.join(", ")),
    ]
}
