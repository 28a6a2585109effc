#![allow(dead_code)]

use async_trait::async_trait;
use mmlu_eval_core::{Backend, CoreError, Generation, GenerationRequest, Result, SamplingParams};
use mmlu_eval_workflow::TokenCounter;
use std::path::Path;
use std::sync::Mutex;

/// Counts whitespace-separated words; predictable stand-in for a BPE tokenizer.
pub struct WordCounter;

impl TokenCounter for WordCounter {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

type Answer = Box<dyn Fn(&GenerationRequest) -> Generation + Send + Sync>;

/// In-memory backend answering each request with a caller-supplied function.
pub struct ScriptedBackend {
    answer: Answer,
    pub batches: Mutex<Vec<usize>>,
    fail: bool,
    drop_last: bool,
}

impl ScriptedBackend {
    pub fn new<F>(answer: F) -> Self
    where
        F: Fn(&GenerationRequest) -> Generation + Send + Sync + 'static,
    {
        Self {
            answer: Box::new(answer),
            batches: Mutex::new(Vec::new()),
            fail: false,
            drop_last: false,
        }
    }

    pub fn failing() -> Self {
        let mut backend = Self::new(|_| Generation::new("", "none"));
        backend.fail = true;
        backend
    }

    /// Returns one generation fewer than requested.
    pub fn short() -> Self {
        let mut backend = Self::new(|_| Generation::new("A", "m"));
        backend.drop_last = true;
        backend
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn run_batch(
        &self,
        requests: Vec<GenerationRequest>,
        _params: &SamplingParams,
        _parallel: usize,
    ) -> Result<Vec<Generation>> {
        self.batches.lock().unwrap().push(requests.len());
        if self.fail {
            return Err(CoreError::Backend("scripted failure".to_string()));
        }
        let mut generations: Vec<Generation> = requests.iter().map(|r| (self.answer)(r)).collect();
        if self.drop_last {
            generations.pop();
        }
        Ok(generations)
    }
}

pub fn csv_row(question: &str, answer: &str) -> String {
    format!("\"{}\",alpha,beta,gamma,delta,{}\n", question, answer)
}

/// Write `<dir>/dev/<subject>_dev.csv` and `<dir>/test/<subject>_test.csv`.
pub fn write_subject(dir: &Path, subject: &str, dev_rows: usize, test_answers: &[&str]) {
    std::fs::create_dir_all(dir.join("dev")).unwrap();
    std::fs::create_dir_all(dir.join("test")).unwrap();

    let dev: String = (0..dev_rows)
        .map(|i| csv_row(&format!("{} dev question {}", subject, i), "A"))
        .collect();
    std::fs::write(dir.join("dev").join(format!("{}_dev.csv", subject)), dev).unwrap();

    let test: String = test_answers
        .iter()
        .enumerate()
        .map(|(i, answer)| csv_row(&format!("{} test question {}", subject, i), answer))
        .collect();
    std::fs::write(dir.join("test").join(format!("{}_test.csv", subject)), test).unwrap();
}
