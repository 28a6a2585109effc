use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::error::CoreError;

/// How a prompt is presented to the backend.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    /// The whole prompt is sent as a single user turn of a chat conversation.
    Chat,
    /// The prompt is sent as raw text and the backend continues it.
    #[default]
    Completion,
}

impl fmt::Display for PromptStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat => write!(f, "chat"),
            Self::Completion => write!(f, "completion"),
        }
    }
}

impl FromStr for PromptStyle {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chat" => Ok(Self::Chat),
            "completion" => Ok(Self::Completion),
            other => Err(CoreError::Config(format!("unknown prompt style: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct SamplingParams {
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,
    #[validate(range(min = 1))]
    pub max_new_tokens: u32,
}

impl Default for SamplingParams {
    /// Greedy decoding of a single token, enough to read one answer letter.
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_new_tokens: 1,
        }
    }
}
