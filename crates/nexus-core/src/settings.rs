use serde::{Deserialize, Serialize};

use crate::tags::MAX_RECENT_TAGS;

// --- AI Settings ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiSettings {
    pub provider: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 30,
        }
    }
}

pub fn ai_configured(settings: &AiSettings) -> bool {
    !settings.provider.is_empty()
        && !settings.model.is_empty()
        && (settings.provider == "ollama" || !settings.api_key.is_empty())
}

// --- Service Settings ---

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub api_debug: bool,
    /// Deployment label reported by `/` and `/diagnostic`
    pub environment: String,
    pub max_recent_tags: usize,
    pub ai: AiSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://nexus.db".to_string(),
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            api_debug: true,
            environment: "development".to_string(),
            max_recent_tags: MAX_RECENT_TAGS,
            ai: AiSettings::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Missing or unparseable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut s = Settings::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("DATABASE_URL") {
            s.database_url = v;
        }
        if let Some(v) = get("API_HOST") {
            s.api_host = v;
        }
        // PORT is what hosting platforms inject; it wins over API_PORT.
        if let Some(port) = get("PORT")
            .and_then(|v| v.parse().ok())
            .or_else(|| get("API_PORT").and_then(|v| v.parse().ok()))
        {
            s.api_port = port;
        }
        if let Some(v) = get("API_DEBUG") {
            s.api_debug = matches!(v.to_lowercase().as_str(), "true" | "1" | "t");
        }
        if let Some(v) = get("RAILWAY_ENVIRONMENT") {
            s.environment = v;
        }
        if let Some(n) = get("MAX_RECENT_TAGS").and_then(|v| v.parse().ok()) {
            s.max_recent_tags = n;
        }
        if let Some(v) = get("LLM_PROVIDER") {
            s.ai.provider = v.to_lowercase();
        }
        if let Some(v) = get("OPENAI_API_KEY") {
            s.ai.api_key = v;
        }
        if let Some(v) = get("OPENAI_MODEL") {
            s.ai.model = v;
        }
        if let Some(n) = get("LLM_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            s.ai.timeout_secs = n;
        }
        s
    }
}
