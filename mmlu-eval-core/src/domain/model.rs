use serde::{Deserialize, Serialize};

/// A single prompt submitted to a backend, split into the shared few-shot
/// prefix and the question-specific suffix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prefix: String,
    pub suffix: String,
}

impl GenerationRequest {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Full prompt text as sent to the model.
    pub fn prompt(&self) -> String {
        let mut prompt = String::with_capacity(self.prefix.len() + self.suffix.len());
        prompt.push_str(&self.prefix);
        prompt.push_str(&self.suffix);
        prompt
    }
}

/// Backend output for one request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    /// Identifier of the model instance that served the request.
    pub model: String,
}

impl Generation {
    pub fn new(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
        }
    }
}
