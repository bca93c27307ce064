use std::time::Duration;

use async_trait::async_trait;
use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage;

use nexus_core::AiSettings;

use crate::{ChatModel, ChatRequest, ExtractError};

fn map_backend(provider: &str) -> Result<LLMBackend, ExtractError> {
    match provider {
        "openai" => Ok(LLMBackend::OpenAI),
        "anthropic" => Ok(LLMBackend::Anthropic),
        "google" => Ok(LLMBackend::Google),
        "ollama" => Ok(LLMBackend::Ollama),
        "groq" => Ok(LLMBackend::Groq),
        "mistral" => Ok(LLMBackend::Mistral),
        "deepseek" => Ok(LLMBackend::DeepSeek),
        other => Err(ExtractError::Model(format!("unknown provider: {other}"))),
    }
}

/// [`ChatModel`] backed by the `llm` crate. A client is built per request.
pub struct LlmChat {
    settings: AiSettings,
}

impl LlmChat {
    pub fn new(settings: AiSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl ChatModel for LlmChat {
    async fn chat(&self, request: ChatRequest<'_>) -> Result<String, ExtractError> {
        let backend = map_backend(&self.settings.provider)?;

        let mut builder = LLMBuilder::new()
            .backend(backend)
            .model(&self.settings.model)
            .system(request.system)
            .temperature(request.temperature)
            .max_tokens(request.max_tokens);

        if !self.settings.api_key.is_empty() {
            builder = builder.api_key(&self.settings.api_key);
        }

        let llm = builder
            .build()
            .map_err(|e| ExtractError::Model(format!("build LLM: {e}")))?;

        let messages = vec![ChatMessage::user().content(request.user).build()];

        let secs = self.settings.timeout_secs;
        let response = tokio::time::timeout(Duration::from_secs(secs), llm.chat(&messages))
            .await
            .map_err(|_| ExtractError::Timeout(secs))?
            .map_err(|e| ExtractError::Model(format!("chat: {e}")))?;

        match response.text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            Some(_) => Err(ExtractError::Model("LLM returned empty text".to_string())),
            None => Err(ExtractError::Model("LLM returned no text".to_string())),
        }
    }
}
