//! Command-line arguments

use clap::{Parser, ValueEnum};
use mmlu_eval_core::PromptStyle;
use std::path::PathBuf;

/// Log output format
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Prompt style accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum StyleArg {
    /// Send the prompt as a single chat user turn
    Chat,
    /// Send the prompt as raw text to continue
    Completion,
}

impl From<StyleArg> for PromptStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Chat => PromptStyle::Chat,
            StyleArg::Completion => PromptStyle::Completion,
        }
    }
}

/// Measure MMLU accuracy and latency of an LLM serving backend.
///
/// Unset flags fall back to `config/default`, `config/local`, `MMLU_EVAL_*`
/// environment variables and finally built-in defaults.
#[derive(Debug, Parser)]
#[command(name = "mmlu-eval", version, about)]
pub struct Cli {
    /// Few-shot examples per prompt
    #[arg(short = 'k', long = "ntrain")]
    pub ntrain: Option<usize>,

    /// Directory holding `dev/` and `test/` tables
    #[arg(short = 'd', long = "data_dir", visible_alias = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Directory for run artifacts
    #[arg(short = 's', long = "save_dir", visible_alias = "save-dir")]
    pub save_dir: Option<PathBuf>,

    /// Maximum number of subjects to evaluate
    #[arg(long)]
    pub nsub: Option<usize>,

    /// Backend identifier recorded in the result file
    #[arg(long)]
    pub backend: Option<String>,

    /// How prompts are sent to the backend
    #[arg(long, value_enum)]
    pub style: Option<StyleArg>,

    /// Backend host, including the scheme
    #[arg(long)]
    pub host: Option<String>,

    /// Backend port
    #[arg(long)]
    pub port: Option<u16>,

    /// Model name sent with each request
    #[arg(long)]
    pub model: Option<String>,

    /// Bearer token for the backend
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Maximum requests in flight per subject
    #[arg(long)]
    pub parallel: Option<usize>,

    /// File the JSON result line is appended to
    #[arg(long = "result-file", visible_alias = "result_file")]
    pub result_file: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Extra configuration file (TOML, YAML or JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_underscore_and_dash_spellings() {
        let cli = Cli::parse_from(["mmlu-eval", "--data_dir", "a", "--save-dir", "b", "-k", "3"]);

        assert_eq!(cli.data_dir, Some(PathBuf::from("a")));
        assert_eq!(cli.save_dir, Some(PathBuf::from("b")));
        assert_eq!(cli.ntrain, Some(3));
        assert_eq!(cli.nsub, None);
    }

    #[test]
    fn test_style_flag() {
        let cli = Cli::parse_from(["mmlu-eval", "--style", "chat"]);
        assert_eq!(cli.style.map(PromptStyle::from), Some(PromptStyle::Chat));
    }
}
