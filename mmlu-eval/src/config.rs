use anyhow::{Context, Result};
use config::{Config as ConfigLoader, Environment, File};
use mmlu_eval_core::{PromptStyle, SamplingParams};
use mmlu_eval_workflow::{DataLoadingConfig, EvaluationConfig, InferenceConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::cli::Cli;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Config {
    pub ntrain: usize,
    pub data_dir: PathBuf,
    pub save_dir: PathBuf,
    pub nsub: usize,
    pub backend: String,
    pub style: PromptStyle,
    pub host: String,
    pub port: Option<u16>,
    #[validate(length(min = 1))]
    pub model: String,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[validate(range(min = 1))]
    pub parallel: usize,
    pub result_file: PathBuf,
    pub timeout_seconds: Option<u64>,
    pub num_gpus: u32,
    #[validate(range(min = 1))]
    pub max_prefix_tokens: usize,
    /// Model whose tokenizer measures the few-shot budget.
    pub tokenizer_model: String,
}

impl Config {
    /// Layer built-in defaults, config files and `MMLU_EVAL_*` variables.
    pub fn load(extra: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigLoader::builder()
            .add_source(ConfigLoader::try_from(&Self::default())?)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = extra {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("MMLU_EVAL")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to assemble configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Command-line flags take precedence over every other source.
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(ntrain) = cli.ntrain {
            self.ntrain = ntrain;
        }
        if let Some(data_dir) = &cli.data_dir {
            self.data_dir = data_dir.clone();
        }
        if let Some(save_dir) = &cli.save_dir {
            self.save_dir = save_dir.clone();
        }
        if let Some(nsub) = cli.nsub {
            self.nsub = nsub;
        }
        if let Some(backend) = &cli.backend {
            self.backend = backend.clone();
        }
        if let Some(style) = cli.style {
            self.style = style.into();
        }
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if cli.port.is_some() {
            self.port = cli.port;
        }
        if let Some(model) = &cli.model {
            self.model = model.clone();
        }
        if cli.api_key.is_some() {
            self.api_key = cli.api_key.clone();
        }
        if let Some(parallel) = cli.parallel {
            self.parallel = parallel;
        }
        if let Some(result_file) = &cli.result_file {
            self.result_file = result_file.clone();
        }
        if cli.timeout_secs.is_some() {
            self.timeout_seconds = cli.timeout_secs;
        }
        self
    }

    pub fn base_url(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host.trim_end_matches('/'), port),
            None => self.host.clone(),
        }
    }

    pub fn data_loading(&self) -> DataLoadingConfig {
        DataLoadingConfig {
            data_dir: self.data_dir.clone(),
            ntrain: self.ntrain,
            nsub: self.nsub,
        }
    }

    pub fn evaluation(&self) -> EvaluationConfig {
        EvaluationConfig {
            ntrain: self.ntrain,
            parallel: self.parallel,
            sampling: SamplingParams::default(),
        }
    }

    pub fn inference(&self) -> InferenceConfig {
        InferenceConfig {
            backend: self.backend.clone(),
            base_url: self.base_url(),
            model: self.model.clone(),
            style: self.style,
            api_key: self.api_key.clone(),
            timeout_seconds: self.timeout_seconds,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ntrain: 5,
            data_dir: PathBuf::from("data"),
            save_dir: PathBuf::from("results"),
            nsub: 60,
            backend: "srt".to_string(),
            style: PromptStyle::Completion,
            host: "http://127.0.0.1".to_string(),
            port: Some(30000),
            model: "default".to_string(),
            api_key: None,
            parallel: 64,
            result_file: PathBuf::from("result.jsonl"),
            timeout_seconds: None,
            num_gpus: 1,
            max_prefix_tokens: 1536,
            tokenizer_model: "gpt-3.5-turbo".to_string(),
        }
    }
}
