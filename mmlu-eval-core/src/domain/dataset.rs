use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Letters used to label answer choices, in column order.
pub const CHOICE_LABELS: [&str; 4] = ["A", "B", "C", "D"];

/// One row of an MMLU table: question, choices and gold label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
    pub question: String,
    pub choices: Vec<String>,
    pub answer: String,
}

impl Question {
    pub fn new(question: impl Into<String>, choices: Vec<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            choices,
            answer: answer.into(),
        }
    }

    /// Build a question from a table row laid out as
    /// `[question, choice_1, .., choice_n, answer]`.
    pub fn from_row(row: &[String]) -> Result<Self> {
        if row.len() < 3 {
            return Err(CoreError::Data(format!(
                "expected at least 3 columns, found {}",
                row.len()
            )));
        }

        let choice_count = row.len() - 2;
        if choice_count > CHOICE_LABELS.len() {
            return Err(CoreError::Data(format!(
                "expected at most {} choices, found {}",
                CHOICE_LABELS.len(),
                choice_count
            )));
        }

        Ok(Self {
            question: row[0].clone(),
            choices: row[1..=choice_count].to_vec(),
            answer: row[row.len() - 1].clone(),
        })
    }

    /// Choices paired with their letter label.
    pub fn labeled_choices(&self) -> impl Iterator<Item = (&'static str, &str)> {
        CHOICE_LABELS
            .iter()
            .copied()
            .zip(self.choices.iter().map(String::as_str))
    }
}

/// Dev and test tables of a single subject.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubjectData {
    pub name: String,
    /// Few-shot examples, already truncated to the requested shot count.
    pub dev: Vec<Question>,
    pub test: Vec<Question>,
}

impl SubjectData {
    pub fn new(name: impl Into<String>, dev: Vec<Question>, test: Vec<Question>) -> Self {
        Self {
            name: name.into(),
            dev,
            test,
        }
    }

    pub fn labels(&self) -> Vec<&str> {
        self.test.iter().map(|q| q.answer.as_str()).collect()
    }
}
