//! OpenAI-compatible client for the three pipeline capabilities:
//! speech-to-text, prompt expansion, image generation.
//!
//! One provider call per invocation — no caching, no batching. Transient
//! transport failures surface as `ProviderError::Connectivity` so the retry
//! wrapper can act on them.

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// System instruction for prompt expansion.
const PROMPT_SYSTEM_INSTRUCTION: &str =
    "You are a helpful assistant that generates image prompts based on voice transcripts.";

/// Capability surface of the AI provider. Object-safe so the gateway can
/// swap in a scripted double for handler tests.
#[async_trait]
pub trait SketchProvider: Send + Sync {
    /// Convert recorded audio into a transcript.
    async fn transcribe(
        &self,
        audio: &[u8],
        mime_type: &str,
        file_name: &str,
    ) -> ProviderResult<String>;

    /// Expand a transcript into a detailed image-generation prompt.
    async fn expand_prompt(&self, transcript: &str) -> ProviderResult<String>;

    /// Generate one image from the prompt; returns the provider-hosted URL.
    async fn generate_image(&self, prompt: &str) -> ProviderResult<String>;
}

/// Production provider client (OpenAI, or any API speaking the same shapes).
pub struct OpenAiClient {
    config: Arc<ProviderConfig>,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: Arc<ProviderConfig>) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;
        Ok(Self { config, http })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Turn a non-success response into a `Provider` error, preferring the
    /// provider's own `error.message` when the body is the usual JSON shape.
    async fn provider_failure(res: reqwest::Response) -> ProviderError {
        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.pointer("/error/message")
                    .and_then(|m| m.as_str())
                    .map(String::from)
            })
            .unwrap_or(body);
        ProviderError::Provider { status, message }
    }
}

#[async_trait]
impl SketchProvider for OpenAiClient {
    async fn transcribe(
        &self,
        audio: &[u8],
        mime_type: &str,
        file_name: &str,
    ) -> ProviderResult<String> {
        debug!(bytes = audio.len(), mime_type, "uploading audio for transcription");
        let part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.config.stt_model.clone());
        let res = self
            .http
            .post(self.endpoint("audio/transcriptions"))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Self::provider_failure(res).await);
        }
        let json: serde_json::Value = res.json().await?;
        json.get("text")
            .and_then(|t| t.as_str())
            .map(|t| t.to_string())
            .ok_or_else(|| ProviderError::Malformed("transcription response has no text".into()))
    }

    async fn expand_prompt(&self, transcript: &str) -> ProviderResult<String> {
        let body = serde_json::json!({
            "model": self.config.chat_model,
            "messages": [
                { "role": "system", "content": PROMPT_SYSTEM_INSTRUCTION },
                {
                    "role": "user",
                    "content": format!(
                        "Generate a detailed image prompt based on this transcript: \"{}\"",
                        transcript
                    )
                }
            ],
        });
        let res = self
            .http
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Self::provider_failure(res).await);
        }
        let json: serde_json::Value = res.json().await?;
        json.pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .map(|c| c.to_string())
            .ok_or_else(|| ProviderError::Malformed("chat response has no completion".into()))
    }

    async fn generate_image(&self, prompt: &str) -> ProviderResult<String> {
        let body = serde_json::json!({
            "model": self.config.image_model,
            "prompt": prompt,
            "n": 1,
            "size": self.config.image_size,
        });
        let res = self
            .http
            .post(self.endpoint("images/generations"))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Self::provider_failure(res).await);
        }
        let json: serde_json::Value = res.json().await?;
        json.pointer("/data/0/url")
            .and_then(|u| u.as_str())
            .map(|u| u.to_string())
            .ok_or_else(|| ProviderError::Malformed("image response has no url".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let config = Arc::new(ProviderConfig::new("https://api.openai.com/v1/", "sk-test"));
        let client = OpenAiClient::new(config).unwrap();
        assert_eq!(
            client.endpoint("audio/transcriptions"),
            "https://api.openai.com/v1/audio/transcriptions"
        );
    }
}
