//! Error types for provider calls

use thiserror::Error;

/// Result type alias for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur when talking to the AI provider
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transient transport failure (connection reset, connect failure, timeout).
    /// The only variant the retry wrapper will retry.
    #[error("Connection error: {0}")]
    Connectivity(String),

    /// Non-success response from the provider (invalid request, quota, policy).
    #[error("Provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// Success status but a response body missing the expected fields.
    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Whether the failure is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Connectivity(_))
    }

    /// Classify a plain error message: connection-reset / connection-error
    /// substrings mean transient. Structured classification via
    /// `From<reqwest::Error>` is preferred; this exists for errors that only
    /// carry text.
    pub fn classify_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.contains("ECONNRESET") || message.contains("Connection error") {
            ProviderError::Connectivity(message)
        } else {
            ProviderError::Provider {
                status: 0,
                message,
            }
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        // Connect failures, timeouts, and mid-body transport drops are
        // transient; everything else is the provider's problem.
        if err.is_connect() || err.is_timeout() {
            return ProviderError::Connectivity(err.to_string());
        }
        if err.is_request() || err.is_body() {
            return ProviderError::Connectivity(err.to_string());
        }
        if err.is_decode() {
            return ProviderError::Malformed(err.to_string());
        }
        ProviderError::Provider {
            status: err.status().map(|s| s.as_u16()).unwrap_or(0),
            message: err.to_string(),
        }
    }
}
