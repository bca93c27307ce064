pub mod engine;
mod parse;
mod prompt;

use std::sync::Arc;

use async_trait::async_trait;
use nexus_core::{ai_configured, AiSettings, Person, Profile};
use serde::Serialize;

pub use engine::LlmChat;

/// Used whenever no better relationship description can be produced.
pub const DEFAULT_RELATIONSHIP: &str = "Contact";

const MIN_TEXT_LEN: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Not enough information provided. Please provide more details.")]
    NotEnoughInformation,
    #[error("{0}")]
    MissingName(&'static str),
    #[error("language model error: {0}")]
    Model(String),
    #[error("language model timed out after {0}s")]
    Timeout(u64),
}

/// One system + user exchange with a chat model.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, request: ChatRequest<'_>) -> Result<String, ExtractError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Llm,
    Basic,
}

/// Structured contact fields pulled out of free text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub first_name: String,
    pub last_name: String,
    pub profile: Profile,
    pub what_they_are_working_on: Option<String>,
    /// Whatever the structured fields did not capture
    pub note: String,
    pub method: ExtractionMethod,
    pub message: String,
}

#[derive(Clone)]
pub struct Extractor {
    model: Option<Arc<dyn ChatModel>>,
}

impl Extractor {
    /// Uses the configured provider, or runs offline when it is not configured.
    pub fn new(settings: &AiSettings) -> Self {
        if ai_configured(settings) {
            Self::with_model(Arc::new(LlmChat::new(settings.clone())))
        } else {
            tracing::warn!("language model not configured, contact extraction will use basic parsing");
            Self::offline()
        }
    }

    pub fn offline() -> Self {
        Self { model: None }
    }

    pub fn with_model(model: Arc<dyn ChatModel>) -> Self {
        Self { model: Some(model) }
    }

    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    /// Turn free text about a person into contact fields. Falls back to basic
    /// parsing when the model is missing, fails, or replies with something unusable.
    pub async fn extract_contact(&self, text: &str) -> Result<Extraction, ExtractError> {
        if text.trim().chars().count() < MIN_TEXT_LEN {
            return Err(ExtractError::NotEnoughInformation);
        }

        let Some(model) = &self.model else {
            tracing::debug!("no language model, using basic extraction");
            return parse::basic_extraction(text);
        };

        let system = prompt::extraction_system_prompt();
        let request = ChatRequest {
            system: &system,
            user: text,
            temperature: 0.1,
            max_tokens: 800,
        };

        let raw = match model.chat(request).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "contact extraction failed, using basic extraction");
                return parse::basic_extraction(text);
            }
        };
        tracing::debug!(raw = %raw, "raw extraction reply");

        match parse::parse_contact_reply(&raw) {
            Some(parsed) => parse::finish_extraction(text, parsed),
            None => {
                tracing::warn!("extraction reply held no JSON object, using basic extraction");
                parse::basic_extraction(text)
            }
        }
    }

    /// Short label for how `user` knows the contact described by `contact_text`.
    /// Never fails; returns [`DEFAULT_RELATIONSHIP`] when it cannot do better.
    pub async fn describe_relationship(
        &self,
        user: &Person,
        contact_text: &str,
        tags: &[String],
    ) -> String {
        let Some(model) = &self.model else {
            return DEFAULT_RELATIONSHIP.to_string();
        };

        let profile_text = prompt::user_profile_text(user);
        if profile_text.trim().is_empty() {
            tracing::debug!(user_id = user.id, "empty user profile, using default relationship");
            return DEFAULT_RELATIONSHIP.to_string();
        }

        let system = prompt::relationship_system_prompt(&profile_text, contact_text, tags);
        let request = ChatRequest {
            system: &system,
            user: prompt::RELATIONSHIP_USER_MESSAGE,
            temperature: 0.7,
            max_tokens: 50,
        };

        match model.chat(request).await {
            Ok(raw) => parse::sanitize_description(&raw).unwrap_or_else(|| {
                tracing::warn!("empty relationship description, using default");
                DEFAULT_RELATIONSHIP.to_string()
            }),
            Err(e) => {
                tracing::warn!(error = %e, "relationship description failed, using default");
                DEFAULT_RELATIONSHIP.to_string()
            }
        }
    }
}
