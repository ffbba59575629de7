//! Provider configuration, read once from the environment at startup.

use crate::error::{ProviderError, ProviderResult};

/// Configuration for the OpenAI-compatible provider. Built from the
/// environment once in `main` and passed explicitly into the client;
/// the API key never leaves the backend process.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL without trailing slash (e.g. https://api.openai.com/v1).
    pub base_url: String,
    /// Bearer API key.
    pub api_key: String,
    /// Speech-to-text model (default: whisper-1).
    pub stt_model: String,
    /// Chat model used for prompt expansion (default: gpt-3.5-turbo).
    pub chat_model: String,
    /// Image generation model (default: dall-e-3).
    pub image_model: String,
    /// Image resolution, provider format (default: 1024x1024).
    pub image_size: String,
}

impl ProviderConfig {
    /// Build from environment: `OPENAI_API_KEY` (required), `OPENAI_BASE_URL`,
    /// `SKETCH_STT_MODEL`, `SKETCH_CHAT_MODEL`, `SKETCH_IMAGE_MODEL`,
    /// `SKETCH_IMAGE_SIZE`.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ProviderError::Config("OPENAI_API_KEY not set".to_string()))?;
        if api_key.trim().is_empty() {
            return Err(ProviderError::Config("OPENAI_API_KEY is empty".to_string()));
        }
        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let stt_model =
            std::env::var("SKETCH_STT_MODEL").unwrap_or_else(|_| "whisper-1".to_string());
        let chat_model =
            std::env::var("SKETCH_CHAT_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string());
        let image_model =
            std::env::var("SKETCH_IMAGE_MODEL").unwrap_or_else(|_| "dall-e-3".to_string());
        let image_size =
            std::env::var("SKETCH_IMAGE_SIZE").unwrap_or_else(|_| "1024x1024".to_string());
        Ok(Self {
            base_url,
            api_key,
            stt_model,
            chat_model,
            image_model,
            image_size,
        })
    }

    /// Create with explicit values (tests, non-env callers).
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            stt_model: "whisper-1".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            image_model: "dall-e-3".to_string(),
            image_size: "1024x1024".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_config_gets_model_defaults() {
        let config = ProviderConfig::new("https://api.openai.com/v1", "sk-test");
        assert_eq!(config.stt_model, "whisper-1");
        assert_eq!(config.chat_model, "gpt-3.5-turbo");
        assert_eq!(config.image_model, "dall-e-3");
        assert_eq!(config.image_size, "1024x1024");
    }
}
