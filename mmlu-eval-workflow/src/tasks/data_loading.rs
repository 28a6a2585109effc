use mmlu_eval_core::{CoreError, Question, Result, SubjectData};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const TEST_SUFFIX: &str = "_test.csv";
const DEV_SUFFIX: &str = "_dev.csv";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataLoadingConfig {
    /// Root holding the `dev/` and `test/` directories.
    pub data_dir: PathBuf,
    /// Dev rows kept per subject.
    pub ntrain: usize,
    /// Maximum number of subjects to evaluate.
    pub nsub: usize,
}

impl Default for DataLoadingConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            ntrain: 5,
            nsub: 60,
        }
    }
}

/// Reads MMLU subject tables laid out as
/// `<data_dir>/dev/<subject>_dev.csv` and `<data_dir>/test/<subject>_test.csv`.
pub struct DatasetLoader {
    config: DataLoadingConfig,
}

impl DatasetLoader {
    pub fn new(config: DataLoadingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DataLoadingConfig {
        &self.config
    }

    /// Subject names found in the test directory, sorted and capped at `nsub`.
    pub async fn discover_subjects(&self) -> Result<Vec<String>> {
        let test_dir = self.config.data_dir.join("test");
        tracing::info!("Discovering subjects in {}", test_dir.display());

        let mut entries = tokio::fs::read_dir(&test_dir).await.map_err(|e| {
            CoreError::Data(format!("cannot read {}: {}", test_dir.display(), e))
        })?;

        let mut subjects = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(pos) = file_name.find(TEST_SUFFIX) {
                subjects.push(file_name[..pos].to_string());
            }
        }

        subjects.sort();
        subjects.truncate(self.config.nsub);

        tracing::info!("Found {} subjects", subjects.len());
        Ok(subjects)
    }

    pub fn dev_path(&self, subject: &str) -> PathBuf {
        self.config
            .data_dir
            .join("dev")
            .join(format!("{}{}", subject, DEV_SUFFIX))
    }

    pub fn test_path(&self, subject: &str) -> PathBuf {
        self.config
            .data_dir
            .join("test")
            .join(format!("{}{}", subject, TEST_SUFFIX))
    }

    /// Load the dev table (truncated to `ntrain` rows) and the test table.
    pub async fn load_subject(&self, subject: &str) -> Result<SubjectData> {
        let mut dev = read_table(&self.dev_path(subject)).await?;
        dev.truncate(self.config.ntrain);
        let test = read_table(&self.test_path(subject)).await?;

        tracing::debug!(
            subject,
            dev_rows = dev.len(),
            test_rows = test.len(),
            "Loaded subject tables"
        );

        Ok(SubjectData::new(subject, dev, test))
    }
}

/// Parse a header-less CSV table of questions.
///
/// Every row must have the same number of columns.
pub async fn read_table(path: &Path) -> Result<Vec<Question>> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| CoreError::Data(format!("cannot read {}: {}", path.display(), e)))?;
    let questions = parse_table(&bytes).map_err(|e| with_context(e, path.display()))?;

    if questions.is_empty() {
        return Err(CoreError::Data(format!("{}: table has no rows", path.display())));
    }

    Ok(questions)
}

/// Parse CSV bytes into questions. Errors carry no path information.
///
/// Cells are kept as written: `NA` stays `NA` and `1.50` is not re-formatted.
pub fn parse_table(bytes: &[u8]) -> Result<Vec<Question>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(false)
        .from_reader(bytes);

    let mut questions = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| CoreError::Data(format!("row {}: {}", index + 1, e)))?;
        let row: Vec<String> = record.iter().map(str::to_string).collect();
        let question =
            Question::from_row(&row).map_err(|e| with_context(e, format!("row {}", index + 1)))?;
        questions.push(question);
    }

    Ok(questions)
}

fn with_context(err: CoreError, context: impl std::fmt::Display) -> CoreError {
    match err {
        CoreError::Data(message) => CoreError::Data(format!("{}: {}", context, message)),
        other => other,
    }
}
