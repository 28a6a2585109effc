use mmlu_eval_core::{CoreError, GenerationRequest, Question, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Token ceiling for the few-shot prefix.
pub const DEFAULT_MAX_PREFIX_TOKENS: usize = 1536;

/// Counts tokens the way the reference model would.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// BPE token counter backed by `tiktoken-rs`.
pub struct TiktokenCounter {
    bpe: tiktoken_rs::CoreBPE,
}

impl TiktokenCounter {
    /// The `cl100k_base` encoding used by `gpt-3.5-turbo`.
    pub fn cl100k() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| CoreError::Tokenizer(e.to_string()))?;
        Ok(Self { bpe })
    }

    pub fn for_model(model: &str) -> Result<Self> {
        let bpe = tiktoken_rs::get_bpe_from_model(model)
            .map_err(|e| CoreError::Tokenizer(format!("{}: {}", model, e)))?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

/// Rendered few-shot examples for one subject.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FewShotPrefix {
    pub text: String,
    /// Examples kept after fitting the token budget.
    pub shots: usize,
    pub tokens: usize,
}

/// Builds MMLU prompts: a per-subject few-shot prefix and one suffix per question.
pub struct PromptBuilder {
    tokenizer: Arc<dyn TokenCounter>,
    max_prefix_tokens: usize,
}

impl PromptBuilder {
    pub fn new(tokenizer: Arc<dyn TokenCounter>) -> Self {
        Self {
            tokenizer,
            max_prefix_tokens: DEFAULT_MAX_PREFIX_TOKENS,
        }
    }

    pub fn with_max_prefix_tokens(mut self, max_prefix_tokens: usize) -> Self {
        self.max_prefix_tokens = max_prefix_tokens;
        self
    }

    pub fn max_prefix_tokens(&self) -> usize {
        self.max_prefix_tokens
    }

    /// Render the first `ntrain` dev rows, dropping one example at a time from
    /// the end until the prefix fits the token budget.
    pub fn few_shot_prefix(&self, subject: &str, dev: &[Question], ntrain: usize) -> FewShotPrefix {
        let mut k = ntrain.min(dev.len());
        let mut text = render_prefix(subject, dev, k);
        let mut tokens = self.tokenizer.count(&text);

        while tokens > self.max_prefix_tokens && k > 0 {
            k -= 1;
            text = render_prefix(subject, dev, k);
            tokens = self.tokenizer.count(&text);
        }

        if tokens > self.max_prefix_tokens {
            tracing::warn!(
                subject,
                tokens,
                budget = self.max_prefix_tokens,
                "Prompt header alone exceeds the token budget"
            );
        }

        tracing::debug!(subject, shots = k, tokens, "Built few-shot prefix");

        FewShotPrefix {
            text,
            shots: k,
            tokens,
        }
    }

    /// One backend request per test question, all sharing `prefix`.
    pub fn requests(&self, prefix: &FewShotPrefix, test: &[Question]) -> Vec<GenerationRequest> {
        test.iter()
            .map(|question| GenerationRequest::new(prefix.text.clone(), question_suffix(question)))
            .collect()
    }
}

/// `"high_school_biology"` becomes `" high school biology"`.
pub fn format_subject(subject: &str) -> String {
    subject.split('_').map(|part| format!(" {}", part)).collect()
}

pub fn header(subject: &str) -> String {
    format!(
        "The following are multiple choice questions (with answers) about{}.\n\n",
        format_subject(subject)
    )
}

pub fn format_example(question: &Question, include_answer: bool) -> String {
    let mut prompt = question.question.clone();
    for (label, choice) in question.labeled_choices() {
        prompt.push_str(&format!("\n{}. {}", label, choice));
    }
    prompt.push_str("\nAnswer:");
    if include_answer {
        prompt.push_str(&format!(" {}\n\n", question.answer));
    }
    prompt
}

/// Header followed by the first `k` dev rows with their answers.
pub fn render_prefix(subject: &str, dev: &[Question], k: usize) -> String {
    let mut prompt = header(subject);
    for question in dev.iter().take(k) {
        prompt.push_str(&format_example(question, true));
    }
    prompt
}

/// Question and choices ending in a bare `Answer:` cue.
pub fn question_suffix(question: &Question) -> String {
    format_example(question, false)
}
