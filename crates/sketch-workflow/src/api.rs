//! Client for the gateway's three endpoints, behind the `SketchApi` seam.

use crate::error::{WorkflowError, WorkflowResult};
use crate::recorder::AudioClip;
use async_trait::async_trait;
use std::time::Duration;

/// The gateway endpoints as seen by the workflow. Object-safe so tests can
/// script successes and failures without a server.
#[async_trait]
pub trait SketchApi: Send + Sync {
    async fn transcribe(&self, clip: &AudioClip) -> WorkflowResult<String>;
    async fn generate_prompt(&self, transcript: &str) -> WorkflowResult<String>;
    async fn generate_image(&self, prompt: &str) -> WorkflowResult<String>;
}

/// HTTP client for a running sketch-gateway.
pub struct HttpSketchApi {
    base_url: String,
    http: reqwest::Client,
}

impl HttpSketchApi {
    /// `base_url` without trailing slash (e.g. http://127.0.0.1:8000).
    pub fn new(base_url: impl Into<String>) -> WorkflowResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| WorkflowError::Api(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Extract the envelope's `error` string from a non-success response,
    /// falling back to a fixed message when the body is unreadable.
    async fn envelope_failure(res: reqwest::Response, fallback: &str) -> WorkflowError {
        let message = res
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|j| j.get("error").and_then(|e| e.as_str()).map(String::from))
            .unwrap_or_else(|| fallback.to_string());
        WorkflowError::Api(message)
    }

    /// Extract a required string field from a success envelope.
    fn envelope_field(json: &serde_json::Value, field: &str) -> WorkflowResult<String> {
        json.get(field)
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .ok_or_else(|| WorkflowError::Api(format!("response missing {}", field)))
    }
}

#[async_trait]
impl SketchApi for HttpSketchApi {
    async fn transcribe(&self, clip: &AudioClip) -> WorkflowResult<String> {
        let part = reqwest::multipart::Part::bytes(clip.bytes.clone())
            .file_name(clip.file_name.clone())
            .mime_str(&clip.mime_type)
            .map_err(|e| WorkflowError::Api(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("audio", part);
        let res = self
            .http
            .post(self.endpoint("transcribe"))
            .multipart(form)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Self::envelope_failure(res, "Failed to transcribe audio").await);
        }
        let json: serde_json::Value = res.json().await?;
        Self::envelope_field(&json, "transcript")
    }

    async fn generate_prompt(&self, transcript: &str) -> WorkflowResult<String> {
        let res = self
            .http
            .post(self.endpoint("generate-prompt"))
            .json(&serde_json::json!({ "transcript": transcript }))
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Self::envelope_failure(res, "Failed to generate prompt").await);
        }
        let json: serde_json::Value = res.json().await?;
        Self::envelope_field(&json, "prompt")
    }

    async fn generate_image(&self, prompt: &str) -> WorkflowResult<String> {
        let res = self
            .http
            .post(self.endpoint("generate-image"))
            .json(&serde_json::json!({ "prompt": prompt }))
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Self::envelope_failure(res, "Failed to generate image").await);
        }
        let json: serde_json::Value = res.json().await?;
        Self::envelope_field(&json, "imageUrl")
    }
}
