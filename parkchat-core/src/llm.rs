use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

use crate::Config;

pub mod gemini;

pub use gemini::GeminiClient;

/// Sampling settings for a single generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_output_tokens: 500,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("language model request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("language model returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("language model response could not be parsed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("language model returned no text{}", .0.as_deref().map(|r| format!(" ({r})")).unwrap_or_default())]
    Empty(Option<String>),
}

#[async_trait]
pub trait LanguageModel: Send + Sync + Debug {
    fn model_id(&self) -> &str;

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError>;
}

/// Gemini client when an API key is configured.
pub fn model_from_config(config: &Config) -> Option<Box<dyn LanguageModel>> {
    let api_key = config.llm_api_key()?;
    Some(Box::new(GeminiClient::new(
        api_key.to_owned(),
        config.model_id().to_owned(),
        config.llm.base_url.clone().filter(|u| !u.is_empty()),
    )))
}
