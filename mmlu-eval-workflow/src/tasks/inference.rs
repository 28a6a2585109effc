use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use mmlu_eval_core::{
    Backend, CoreError, Generation, GenerationRequest, PromptStyle, Result, SamplingParams,
};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Identifier recorded in the result file.
    pub backend: String,
    pub base_url: String,
    /// Model name sent with every request.
    pub model: String,
    pub style: PromptStyle,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Per-request timeout; `None` waits indefinitely.
    pub timeout_seconds: Option<u64>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            backend: "srt".to_string(),
            base_url: "http://127.0.0.1:30000".to_string(),
            model: "default".to_string(),
            style: PromptStyle::Completion,
            api_key: None,
            timeout_seconds: None,
        }
    }
}

/// Client for servers exposing the OpenAI-compatible completion endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    client: Client,
    config: InferenceConfig,
    base_url: Url,
}

impl OpenAiBackend {
    pub fn new(config: InferenceConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| CoreError::Config(format!("invalid base url {}: {}", config.base_url, e)))?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(api_key) = &config.api_key {
            let value = header::HeaderValue::try_from(format!("Bearer {}", api_key))
                .map_err(|e| CoreError::Config(format!("invalid api key: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let mut builder = Client::builder().default_headers(headers);
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let client = builder
            .build()
            .map_err(|e| CoreError::Backend(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        let path = match self.config.style {
            PromptStyle::Chat => "v1/chat/completions",
            PromptStyle::Completion => "v1/completions",
        };
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{}/{}", base, path)
    }

    fn request_body(&self, request: &GenerationRequest, params: &SamplingParams) -> serde_json::Value {
        let prompt = request.prompt();
        match self.config.style {
            PromptStyle::Chat => json!({
                "model": self.config.model,
                "messages": [{"role": "user", "content": prompt}],
                "temperature": params.temperature,
                "max_tokens": params.max_new_tokens,
            }),
            PromptStyle::Completion => json!({
                "model": self.config.model,
                "prompt": prompt,
                "temperature": params.temperature,
                "max_tokens": params.max_new_tokens,
            }),
        }
    }

    async fn generate(
        &self,
        index: usize,
        request: GenerationRequest,
        params: &SamplingParams,
    ) -> Result<Generation> {
        let url = self.endpoint();
        tracing::debug!(index, url = %url, "Sending generation request");

        let response = self
            .client
            .post(&url)
            .json(&self.request_body(&request, params))
            .send()
            .await
            .map_err(|e| CoreError::Backend(format!("request {} failed: {}", index, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CoreError::Backend(format!("request {} body: {}", index, e)))?;

        if !status.is_success() {
            return Err(CoreError::Backend(format!(
                "request {} returned {}: {}",
                index, status, body
            )));
        }

        let parsed: CompletionResponse = serde_json::from_str(&body).map_err(|e| {
            CoreError::Backend(format!("request {} returned an undecodable body: {}", index, e))
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::Backend(format!("request {} returned no choices", index)))?;

        let text = match self.config.style {
            PromptStyle::Chat => choice.message.and_then(|m| m.content).unwrap_or_default(),
            PromptStyle::Completion => choice.text.unwrap_or_default(),
        };

        Ok(Generation {
            text,
            model: parsed.model.unwrap_or_else(|| self.config.model.clone()),
        })
    }
}

#[async_trait]
impl Backend for OpenAiBackend {
    fn name(&self) -> &str {
        &self.config.backend
    }

    async fn run_batch(
        &self,
        requests: Vec<GenerationRequest>,
        params: &SamplingParams,
        parallel: usize,
    ) -> Result<Vec<Generation>> {
        tracing::info!(
            "Running batch of {} requests against {} ({} style, parallel {})",
            requests.len(),
            self.base_url,
            self.config.style,
            parallel
        );

        stream::iter(requests.into_iter().enumerate())
            .map(|(index, request)| self.generate(index, request, params))
            .buffered(parallel.max(1))
            .try_collect()
            .await
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}
