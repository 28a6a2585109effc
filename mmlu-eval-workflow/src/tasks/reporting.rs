use mmlu_eval_core::{CoreError, Result};
use mmlu_eval_metrics::{round_decimal, ModelCounts, RunSummary};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Run settings echoed into the result record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunOptions {
    pub nsub: usize,
    pub parallel: usize,
}

/// One line of the result file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultRecord {
    pub task: String,
    pub backend: String,
    pub num_gpus: u32,
    /// Seconds, rounded to 3 decimals.
    #[serde(with = "rust_decimal::serde::float")]
    pub latency: Decimal,
    /// Weighted accuracy, rounded to 3 decimals.
    #[serde(with = "rust_decimal::serde::float")]
    pub accuracy: Decimal,
    pub num_requests: usize,
    pub model_counts: ModelCounts,
    pub other: RunOptions,
}

impl ResultRecord {
    pub fn from_summary(
        summary: &RunSummary,
        backend: impl Into<String>,
        num_gpus: u32,
        other: RunOptions,
    ) -> Self {
        Self {
            task: "mmlu".to_string(),
            backend: backend.into(),
            num_gpus,
            latency: round_decimal(summary.total_latency.as_secs_f64(), 3),
            accuracy: round_decimal(summary.accuracy, 3),
            num_requests: summary.num_requests,
            model_counts: summary.model_counts.clone(),
            other,
        }
    }
}

/// Appends result records to a newline-delimited JSON file.
pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, record: &ResultRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::info!("Appended result to {}", self.path.display());
        Ok(())
    }
}

/// Read every record of a result file, skipping blank lines.
pub async fn read_records(path: &Path) -> Result<Vec<ResultRecord>> {
    let content = tokio::fs::read_to_string(path).await?;

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|e| {
                CoreError::Serialization(format!("{} line {}: {}", path.display(), index + 1, e))
            })
        })
        .collect()
}
