pub mod providers;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// LLM provider types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LLMProvider {
    OpenAI,
    LMStudio,
}

impl FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "lmstudio" | "local" => Ok(LLMProvider::LMStudio),
            other => Err(format!("unknown LLM provider: {}", other)),
        }
    }
}

impl fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LLMProvider::OpenAI => f.write_str("openai"),
            LLMProvider::LMStudio => f.write_str("lmstudio"),
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    /// Chat-completions endpoint; the provider default is used when unset
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::OpenAI,
            endpoint: None,
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 1024,
            temperature: 0.3,
            timeout_seconds: 120,
        }
    }
}

impl LLMConfig {
    /// Endpoint to post chat completions to
    pub fn resolved_endpoint(&self) -> String {
        match (&self.endpoint, self.provider) {
            (Some(endpoint), _) => endpoint.clone(),
            (None, LLMProvider::OpenAI) => providers::OPENAI_CHAT_URL.to_string(),
            (None, LLMProvider::LMStudio) => providers::LMSTUDIO_CHAT_URL.to_string(),
        }
    }
}

/// Chat message for LLM communication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// LLM response
#[derive(Debug, Clone)]
pub struct LLMResponse {
    pub content: String,
    pub tokens_used: Option<u32>,
}

/// Text-generation oracle. Any error is scoped to the request that produced it.
#[async_trait]
pub trait LLM: Send + Sync {
    async fn chat(&self, messages: Vec<ChatMessage>, temperature: f32) -> Result<LLMResponse>;
    async fn is_available(&self) -> bool;
    fn provider_type(&self) -> LLMProvider;
}

/// Create LLM instance based on configuration
pub fn create_llm(config: &LLMConfig) -> Result<Box<dyn LLM>> {
    Ok(Box::new(providers::ChatCompletionsProvider::new(config.clone())?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("OpenAI".parse::<LLMProvider>().unwrap(), LLMProvider::OpenAI);
        assert_eq!("lmstudio".parse::<LLMProvider>().unwrap(), LLMProvider::LMStudio);
        assert!("gemini".parse::<LLMProvider>().is_err());
    }

    #[test]
    fn test_resolved_endpoint() {
        let mut config = LLMConfig::default();
        assert_eq!(config.resolved_endpoint(), "https://api.openai.com/v1/chat/completions");

        config.provider = LLMProvider::LMStudio;
        assert_eq!(config.resolved_endpoint(), "http://localhost:1234/v1/chat/completions");

        config.endpoint = Some("http://gpu-box:8080/v1/chat/completions".to_string());
        assert_eq!(config.resolved_endpoint(), "http://gpu-box:8080/v1/chat/completions");
    }
}
