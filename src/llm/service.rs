use std::env;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use super::openai::OpenAiProvider;
use super::provider::LlmProvider;
use super::types::{ChatMessage, ChatRequest};
use crate::core::config::ConfigService;
use crate::core::errors::ApiError;

/// Resolves model ids and sampling parameters from config and delegates
/// to the configured provider.
#[derive(Clone)]
pub struct LlmService {
    provider: Arc<dyn LlmProvider>,
    config: ConfigService,
}

impl LlmService {
    pub fn new(provider: Arc<dyn LlmProvider>, config: ConfigService) -> Self {
        Self { provider, config }
    }

    /// Build the service from the `llm` config section. The API key comes
    /// from `secrets.yaml` or the `OPENAI_API_KEY` environment variable.
    pub fn from_config(config: ConfigService) -> Result<Self, ApiError> {
        let app_config = config.load_config()?;
        let llm = app_config.get("llm").cloned().unwrap_or(Value::Null);

        let base_url = llm
            .get("base_url")
            .and_then(|v| v.as_str())
            .unwrap_or("https://api.openai.com")
            .to_string();
        let api_key = llm
            .get("api_key")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .or_else(|| env::var("OPENAI_API_KEY").ok())
            .filter(|s| !s.trim().is_empty());
        let timeout = llm
            .get("request_timeout_secs")
            .and_then(|v| v.as_u64())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(120));

        if api_key.is_none() {
            tracing::warn!("No LLM API key configured; requests to {} may fail", base_url);
        }

        let provider = Arc::new(OpenAiProvider::new(base_url, api_key, timeout));
        Ok(Self::new(provider, config))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn health_check(&self) -> Result<bool, ApiError> {
        self.provider.health_check().await
    }

    /// Chat completion with the configured chat model and sampling defaults.
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, ApiError> {
        let llm = self.llm_section();

        let model = llm
            .get("chat_model")
            .and_then(|v| v.as_str())
            .unwrap_or("gpt-4o-mini")
            .to_string();

        let mut request = ChatRequest::new(messages);
        request.temperature = llm.get("temperature").and_then(|v| v.as_f64());
        request.max_tokens = llm
            .get("max_tokens")
            .and_then(|v| v.as_u64())
            .map(|v| v as u32);

        self.provider.chat(request, &model).await
    }

    /// Embeddings with the configured embedding model.
    pub async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let llm = self.llm_section();
        let model = llm
            .get("embedding_model")
            .and_then(|v| v.as_str())
            .unwrap_or("text-embedding-3-small")
            .to_string();

        self.provider.embed(inputs, &model).await
    }

    pub fn embedding_model(&self) -> String {
        self.llm_section()
            .get("embedding_model")
            .and_then(|v| v.as_str())
            .unwrap_or("text-embedding-3-small")
            .to_string()
    }

    fn llm_section(&self) -> Value {
        self.config
            .load_config()
            .ok()
            .and_then(|c| c.get("llm").cloned())
            .unwrap_or(Value::Null)
    }
}
