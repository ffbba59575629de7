//! Error types for the client workflow

use thiserror::Error;

/// Result type alias for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Errors that can occur while driving the record → prompt → image workflow
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// Recording stopped but no captured audio ever materialized.
    #[error("No audio recording available")]
    NoAudio,

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio stream error: {0}")]
    AudioStream(String),

    /// Failure reported by a gateway endpoint; carries the envelope's
    /// human-readable message verbatim.
    #[error("{0}")]
    Api(String),
}

impl From<cpal::DefaultStreamConfigError> for WorkflowError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        WorkflowError::AudioDevice(err.to_string())
    }
}

impl From<cpal::BuildStreamError> for WorkflowError {
    fn from(err: cpal::BuildStreamError) -> Self {
        WorkflowError::AudioStream(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for WorkflowError {
    fn from(err: cpal::PlayStreamError) -> Self {
        WorkflowError::AudioStream(err.to_string())
    }
}

impl From<reqwest::Error> for WorkflowError {
    fn from(err: reqwest::Error) -> Self {
        WorkflowError::Api(err.to_string())
    }
}
