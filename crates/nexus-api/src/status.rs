use axum::extract::State;
use axum::Json;
use chrono::Utc;
use nexus_core::ai_configured;
use serde_json::{json, Value};

use crate::AppState;

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let database = match state.store.ping().await {
        Ok(()) => "connected".to_string(),
        Err(e) => format!("error: {e}"),
    };
    Json(json!({
        "status": "API is running",
        "database": database,
        "environment": state.settings.environment,
    }))
}

fn env_set(name: &str) -> bool {
    std::env::var_os(name).is_some()
}

pub async fn diagnostic(State(state): State<AppState>) -> Json<Value> {
    let settings = &state.settings;
    let database = match state.store.ping().await {
        Ok(()) => json!({ "status": "connected", "test_query": "successful" }),
        Err(e) => json!({ "status": "error", "error": e.to_string() }),
    };

    Json(json!({
        "api_status": "running",
        "timestamp": Utc::now().to_rfc3339(),
        "environment": settings.environment,
        "version": env!("CARGO_PKG_VERSION"),
        "environment_variables": {
            "PORT": std::env::var("PORT").ok(),
            "API_HOST": std::env::var("API_HOST").ok(),
            "DATABASE_URL_EXISTS": env_set("DATABASE_URL"),
            "OPENAI_API_KEY_EXISTS": env_set("OPENAI_API_KEY"),
        },
        "config": {
            "api_host": settings.api_host,
            "api_port": settings.api_port,
            "api_debug": settings.api_debug,
            "database_url_length": settings.database_url.len(),
            "max_recent_tags": settings.max_recent_tags,
        },
        "database": database,
        "llm": {
            "available": state.extractor.is_available(),
            "configured": ai_configured(&settings.ai),
            "provider": settings.ai.provider,
            "model": settings.ai.model,
        },
    }))
}
